use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_relay::application::ports::{
    ConversationRepository, LlmClient, LlmClientError, RepositoryError,
};
use chat_relay::application::services::{ChatOptions, ChatService, ChatServiceError};
use chat_relay::domain::{
    Conversation, ConversationId, Message, MessageRole, UserId, provisional_title,
};
use chat_relay::infrastructure::llm::MockLlmClient;
use chat_relay::infrastructure::persistence::InMemoryConversationRepository;

struct Fixture {
    service: ChatService,
    repository: Arc<InMemoryConversationRepository>,
    llm: Arc<MockLlmClient>,
}

fn fixture_with(llm: MockLlmClient, options: ChatOptions) -> Fixture {
    let repository = Arc::new(InMemoryConversationRepository::new());
    let llm = Arc::new(llm);
    let conversations: Arc<dyn ConversationRepository> = repository.clone();
    let llm_client: Arc<dyn LlmClient> = llm.clone();

    Fixture {
        service: ChatService::new(conversations, llm_client, options),
        repository,
        llm,
    }
}

fn fixture(llm: MockLlmClient) -> Fixture {
    fixture_with(llm, ChatOptions::default())
}

fn alice() -> UserId {
    UserId::new("alice")
}

fn bob() -> UserId {
    UserId::new("bob")
}

/// Passes through to an in-memory store, failing the selected operations.
#[derive(Default)]
struct FaultyRepository {
    inner: InMemoryConversationRepository,
    fail_assistant_writes: bool,
    fail_title_updates: bool,
}

#[async_trait::async_trait]
impl ConversationRepository for FaultyRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        self.inner.create_conversation(conversation).await
    }

    async fn find_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        self.inner.find_conversation(id, owner).await
    }

    async fn list_conversations(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        self.inner.list_conversations(owner).await
    }

    async fn update_title(
        &self,
        id: ConversationId,
        owner: &UserId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        if self.fail_title_updates {
            return Err(RepositoryError::QueryFailed("connection reset".to_string()));
        }
        self.inner.update_title(id, owner, title).await
    }

    async fn delete_conversation(
        &self,
        id: ConversationId,
        owner: &UserId,
    ) -> Result<bool, RepositoryError> {
        self.inner.delete_conversation(id, owner).await
    }

    async fn append_message(
        &self,
        message: &Message,
        owner: &UserId,
    ) -> Result<(), RepositoryError> {
        if self.fail_assistant_writes && message.role == MessageRole::Assistant {
            return Err(RepositoryError::QueryFailed("disk full".to_string()));
        }
        self.inner.append_message(message, owner).await
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.inner.get_messages(conversation_id, owner, limit).await
    }
}

/// Records the prompt, then sleeps before replying so concurrent turns can interleave.
struct DelayedLlmClient {
    delay: Duration,
    reply: &'static str,
    prompts: Mutex<Vec<String>>,
}

impl DelayedLlmClient {
    fn new(delay: Duration, reply: &'static str) -> Self {
        Self {
            delay,
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn received_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for DelayedLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.to_string())
    }
}

fn delayed_service(serialize_turns: bool) -> (ChatService, Arc<DelayedLlmClient>) {
    let llm = Arc::new(DelayedLlmClient::new(Duration::from_millis(20), "ok"));
    let conversations: Arc<dyn ConversationRepository> =
        Arc::new(InMemoryConversationRepository::new());
    let llm_client: Arc<dyn LlmClient> = llm.clone();
    let options = ChatOptions {
        serialize_turns,
        ..ChatOptions::default()
    };
    (ChatService::new(conversations, llm_client, options), llm)
}

#[tokio::test]
async fn given_fresh_conversation_when_handling_turn_then_model_receives_raw_prompt() {
    let f = fixture(MockLlmClient::fixed("Hello"));

    let outcome = f.service.handle_turn(&alice(), "Hi", None).await.unwrap();

    assert_eq!(outcome.reply, "Hello");
    assert_eq!(f.llm.received_prompts(), vec!["Hi".to_string()]);
}

#[tokio::test]
async fn given_previous_turn_when_handling_next_turn_then_prompt_carries_history() {
    let f = fixture(MockLlmClient::fixed("Hello"));
    let first = f.service.handle_turn(&alice(), "Hi", None).await.unwrap();

    let second = f
        .service
        .handle_turn(&alice(), "How are you", Some(first.conversation_id))
        .await
        .unwrap();

    assert_eq!(second.conversation_id, first.conversation_id);
    let prompts = f.llm.received_prompts();
    assert_eq!(
        prompts[1],
        "Previous conversation:\nUser: Hi\nAssistant: Hello\n\nCurrent message:\nHow are you\n\nPlease respond remembering our previous conversation and maintain context."
    );
}

#[tokio::test]
async fn given_completed_turn_when_listing_history_then_messages_are_in_creation_order() {
    let f = fixture(MockLlmClient::echo());
    let first = f.service.handle_turn(&alice(), "one", None).await.unwrap();
    f.service
        .handle_turn(&alice(), "two", Some(first.conversation_id))
        .await
        .unwrap();

    let messages = f
        .service
        .list_history(&alice(), first.conversation_id)
        .await
        .unwrap();

    let roles: Vec<&MessageRole> = messages.iter().map(|m| &m.role).collect();
    assert_eq!(
        roles,
        vec![
            &MessageRole::User,
            &MessageRole::Assistant,
            &MessageRole::User,
            &MessageRole::Assistant
        ]
    );
    assert_eq!(messages[0].content, "one");
    assert_eq!(messages[1].content, "Echo: one");
    assert_eq!(messages[2].content, "two");
    assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn given_short_first_prompt_when_turn_completes_then_title_is_prompt_without_ellipsis() {
    let f = fixture(MockLlmClient::echo());

    f.service.handle_turn(&alice(), "Hey", None).await.unwrap();

    let conversations = f.service.list_conversations(&alice()).await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Hey");
}

#[tokio::test]
async fn given_long_first_prompt_when_turn_completes_then_title_is_truncated_with_ellipsis() {
    let f = fixture(MockLlmClient::echo());
    let prompt = "z".repeat(51);

    f.service.handle_turn(&alice(), &prompt, None).await.unwrap();

    let conversations = f.service.list_conversations(&alice()).await.unwrap();
    assert_eq!(conversations[0].title, format!("{}...", "z".repeat(50)));
}

#[tokio::test]
async fn given_failed_first_turn_when_reading_title_then_provisional_title_keeps_ellipsis() {
    let f = fixture(MockLlmClient::failing("model offline"));

    let result = f.service.handle_turn(&alice(), "Hey", None).await;

    assert!(matches!(result, Err(ChatServiceError::Inference(_))));
    let conversations = f.service.list_conversations(&alice()).await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Hey...");
}

#[tokio::test]
async fn given_second_turn_when_completed_then_title_is_not_rewritten() {
    let f = fixture(MockLlmClient::echo());
    let first = f.service.handle_turn(&alice(), "First topic", None).await.unwrap();

    f.service
        .handle_turn(&alice(), "Something else entirely", Some(first.conversation_id))
        .await
        .unwrap();

    let conversations = f.service.list_conversations(&alice()).await.unwrap();
    assert_eq!(conversations[0].title, "First topic");
}

#[tokio::test]
async fn given_existing_empty_conversation_when_first_turn_completes_then_title_is_overwritten() {
    let f = fixture(MockLlmClient::echo());
    let existing = Conversation::new(alice(), "Untitled".to_string());
    f.repository.create_conversation(&existing).await.unwrap();

    let outcome = f
        .service
        .handle_turn(&alice(), "Budget for March", Some(existing.id))
        .await
        .unwrap();

    assert_eq!(outcome.conversation_id, existing.id);
    let stored = f
        .repository
        .find_conversation(existing.id, &alice())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Budget for March");
}

#[tokio::test]
async fn given_identical_turns_without_id_when_handled_then_two_conversations_exist() {
    let f = fixture(MockLlmClient::echo());

    let a = f.service.handle_turn(&alice(), "same", None).await.unwrap();
    let b = f.service.handle_turn(&alice(), "same", None).await.unwrap();

    assert_ne!(a.conversation_id, b.conversation_id);
    assert_eq!(f.service.list_conversations(&alice()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn given_unknown_conversation_id_when_handling_turn_then_new_conversation_is_created() {
    let f = fixture(MockLlmClient::echo());
    let unknown = ConversationId::new();

    let outcome = f
        .service
        .handle_turn(&alice(), "Hi", Some(unknown))
        .await
        .unwrap();

    assert_ne!(outcome.conversation_id, unknown);
    assert_eq!(f.llm.received_prompts(), vec!["Hi".to_string()]);
}

#[tokio::test]
async fn given_other_users_conversation_id_when_handling_turn_then_it_is_not_extended() {
    let f = fixture(MockLlmClient::echo());
    let owned = f.service.handle_turn(&alice(), "private", None).await.unwrap();

    let intruder = f
        .service
        .handle_turn(&bob(), "let me in", Some(owned.conversation_id))
        .await
        .unwrap();

    assert_ne!(intruder.conversation_id, owned.conversation_id);
    assert_eq!(f.llm.received_prompts()[1], "let me in");
    let alice_messages = f
        .service
        .list_history(&alice(), owned.conversation_id)
        .await
        .unwrap();
    assert_eq!(alice_messages.len(), 2);
}

#[tokio::test]
async fn given_other_users_conversation_when_listing_history_then_not_found() {
    let f = fixture(MockLlmClient::echo());
    let owned = f.service.handle_turn(&alice(), "private", None).await.unwrap();

    let result = f.service.list_history(&bob(), owned.conversation_id).await;

    assert!(matches!(
        result,
        Err(ChatServiceError::ConversationNotFound(id)) if id == owned.conversation_id
    ));
}

#[tokio::test]
async fn given_other_users_conversation_when_deleting_then_not_found_and_kept() {
    let f = fixture(MockLlmClient::echo());
    let owned = f.service.handle_turn(&alice(), "private", None).await.unwrap();

    let result = f
        .service
        .delete_conversation(&bob(), owned.conversation_id)
        .await;

    assert!(matches!(result, Err(ChatServiceError::ConversationNotFound(_))));
    assert!(
        f.service
            .list_history(&alice(), owned.conversation_id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn given_two_users_when_listing_conversations_then_each_sees_only_their_own() {
    let f = fixture(MockLlmClient::echo());
    f.service.handle_turn(&alice(), "a1", None).await.unwrap();
    f.service.handle_turn(&alice(), "a2", None).await.unwrap();
    f.service.handle_turn(&bob(), "b1", None).await.unwrap();

    let alice_titles: Vec<String> = f
        .service
        .list_conversations(&alice())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.title)
        .collect();
    let bob_conversations = f.service.list_conversations(&bob()).await.unwrap();

    assert_eq!(alice_titles.len(), 2);
    assert!(!alice_titles.contains(&"b1".to_string()));
    assert_eq!(bob_conversations.len(), 1);
    assert_eq!(bob_conversations[0].title, "b1");
}

#[tokio::test]
async fn given_deleted_conversation_when_listing_history_then_not_found_and_messages_gone() {
    let f = fixture(MockLlmClient::echo());
    let outcome = f.service.handle_turn(&alice(), "bye", None).await.unwrap();
    assert_eq!(f.repository.message_count(), 2);

    f.service
        .delete_conversation(&alice(), outcome.conversation_id)
        .await
        .unwrap();

    let result = f
        .service
        .list_history(&alice(), outcome.conversation_id)
        .await;
    assert!(matches!(result, Err(ChatServiceError::ConversationNotFound(_))));
    assert_eq!(f.repository.message_count(), 0);
}

#[tokio::test]
async fn given_inference_failure_when_handling_turn_then_user_message_is_kept() {
    let f = fixture(MockLlmClient::failing("quota exceeded"));

    let result = f.service.handle_turn(&alice(), "Hello?", None).await;

    assert!(matches!(
        result,
        Err(ChatServiceError::Inference(LlmClientError::ApiRequestFailed(_)))
    ));
    let conversation = &f.service.list_conversations(&alice()).await.unwrap()[0];
    let messages = f
        .service
        .list_history(&alice(), conversation.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "Hello?");
}

#[tokio::test]
async fn given_assistant_write_failure_when_handling_turn_then_reply_is_not_returned() {
    let repository = Arc::new(FaultyRepository {
        fail_assistant_writes: true,
        ..FaultyRepository::default()
    });
    let llm = Arc::new(MockLlmClient::fixed("generated"));
    let conversations: Arc<dyn ConversationRepository> = repository.clone();
    let llm_client: Arc<dyn LlmClient> = llm.clone();
    let service = ChatService::new(conversations, llm_client, ChatOptions::default());

    let result = service.handle_turn(&alice(), "Hi", None).await;

    assert!(matches!(result, Err(ChatServiceError::Store(_))));
    assert_eq!(llm.received_prompts().len(), 1);
    assert_eq!(repository.inner.message_count(), 1);
    let conversation = &service.list_conversations(&alice()).await.unwrap()[0];
    assert_eq!(conversation.title, "Hi...");
}

#[tokio::test]
async fn given_title_update_failure_when_first_turn_completes_then_reply_is_still_returned() {
    let repository = Arc::new(FaultyRepository {
        fail_title_updates: true,
        ..FaultyRepository::default()
    });
    let conversations: Arc<dyn ConversationRepository> = repository.clone();
    let service = ChatService::new(
        conversations,
        Arc::new(MockLlmClient::fixed("Hello")),
        ChatOptions::default(),
    );

    let outcome = service.handle_turn(&alice(), "Hey", None).await.unwrap();

    assert_eq!(outcome.reply, "Hello");
    assert_eq!(repository.inner.message_count(), 2);
    let stored = repository
        .find_conversation(outcome.conversation_id, &alice())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Hey...");
}

#[tokio::test]
async fn given_unrecognized_role_in_history_when_handling_turn_then_dropped_but_history_counts() {
    let f = fixture(MockLlmClient::echo());
    let existing = Conversation::new(alice(), provisional_title("seeded"));
    f.repository.create_conversation(&existing).await.unwrap();
    let foreign = Message::new(
        existing.id,
        MessageRole::Unrecognized("system".to_string()),
        "be terse".to_string(),
    );
    f.repository.append_message(&foreign, &alice()).await.unwrap();

    f.service
        .handle_turn(&alice(), "Hi", Some(existing.id))
        .await
        .unwrap();

    let prompt = &f.llm.received_prompts()[0];
    assert!(prompt.starts_with("Previous conversation:\n\n\nCurrent message:\nHi"));
    assert!(!prompt.contains("be terse"));
    let stored = f
        .repository
        .find_conversation(existing.id, &alice())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "seeded...");
}

#[tokio::test]
async fn given_history_beyond_limit_when_handling_turn_then_oldest_messages_are_used() {
    let options = ChatOptions {
        history_limit: 2,
        ..ChatOptions::default()
    };
    let f = fixture_with(MockLlmClient::echo(), options);
    let first = f.service.handle_turn(&alice(), "one", None).await.unwrap();
    let id = Some(first.conversation_id);
    f.service.handle_turn(&alice(), "two", id).await.unwrap();

    f.service.handle_turn(&alice(), "three", id).await.unwrap();

    let prompt = &f.llm.received_prompts()[2];
    assert!(prompt.contains("User: one\nAssistant: Echo: one\n\n"));
    assert!(!prompt.contains("User: two"));
}

#[tokio::test]
async fn given_many_messages_when_listing_history_then_list_limit_applies() {
    let options = ChatOptions {
        list_limit: 3,
        ..ChatOptions::default()
    };
    let f = fixture_with(MockLlmClient::echo(), options);
    let first = f.service.handle_turn(&alice(), "one", None).await.unwrap();
    f.service
        .handle_turn(&alice(), "two", Some(first.conversation_id))
        .await
        .unwrap();

    let messages = f
        .service
        .list_history(&alice(), first.conversation_id)
        .await
        .unwrap();

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, "two");
}

#[tokio::test]
async fn given_inference_deadline_when_model_is_slow_then_turn_fails_with_timeout() {
    let repository: Arc<dyn ConversationRepository> =
        Arc::new(InMemoryConversationRepository::new());
    let options = ChatOptions {
        inference_timeout: Some(Duration::from_millis(20)),
        ..ChatOptions::default()
    };
    let slow = DelayedLlmClient::new(Duration::from_secs(5), "too late");
    let service = ChatService::new(repository, Arc::new(slow), options);

    let result = service.handle_turn(&alice(), "Hi", None).await;

    match result {
        Err(ChatServiceError::Inference(LlmClientError::Timeout(deadline))) => {
            assert_eq!(deadline, Duration::from_millis(20));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn given_serialized_turns_when_two_run_concurrently_then_second_sees_first_reply() {
    let (service, llm) = delayed_service(true);
    let user = alice();
    let seed = service.handle_turn(&user, "seed", None).await.unwrap();
    let id = Some(seed.conversation_id);

    let (a, b) = tokio::join!(
        service.handle_turn(&user, "a", id),
        service.handle_turn(&user, "b", id)
    );
    a.unwrap();
    b.unwrap();

    let prompts = llm.received_prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("User: seed\nAssistant: ok\n\nCurrent message:\na"));
    assert!(prompts[2].contains("User: seed\nAssistant: ok\nUser: a\nAssistant: ok\n\n"));
    let messages = service
        .list_history(&user, seed.conversation_id)
        .await
        .unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["seed", "ok", "a", "ok", "b", "ok"]);
}

#[tokio::test]
async fn given_unserialized_turns_when_two_run_concurrently_then_second_misses_first_reply() {
    let (service, llm) = delayed_service(false);
    let user = alice();
    let seed = service.handle_turn(&user, "seed", None).await.unwrap();
    let id = Some(seed.conversation_id);

    let (a, b) = tokio::join!(
        service.handle_turn(&user, "a", id),
        service.handle_turn(&user, "b", id)
    );
    a.unwrap();
    b.unwrap();

    let prompts = llm.received_prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains("User: seed\nAssistant: ok\nUser: a\n\nCurrent message:\nb"));
    assert_eq!(prompts[2].matches("Assistant: ").count(), 1);
    let messages = service
        .list_history(&user, seed.conversation_id)
        .await
        .unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["seed", "ok", "a", "b", "ok", "ok"]);
}
