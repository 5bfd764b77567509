use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use chat_relay::application::ports::ConversationRepository;
use chat_relay::application::services::ChatService;
use chat_relay::infrastructure::auth::create_identity_verifier;
use chat_relay::infrastructure::llm::create_llm_client;
use chat_relay::infrastructure::observability::{TracingConfig, init_tracing};
use chat_relay::infrastructure::persistence::{
    InMemoryConversationRepository, PgConversationRepository, create_pool, run_migrations,
};
use chat_relay::presentation::config::{DatabaseSettings, StoreProvider};
use chat_relay::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::from_settings(environment, &settings.logging));

    let conversations = build_repository(&settings.database).await?;
    let llm_client = create_llm_client(&settings.llm);
    let identity_verifier = create_identity_verifier(&settings.auth);

    let chat_service = Arc::new(ChatService::new(
        conversations,
        llm_client,
        settings.chat_options(),
    ));

    let state = AppState {
        chat_service,
        identity_verifier,
        default_model_name: settings.llm.default_model_name.clone(),
        expose_error_details: settings.server.expose_error_details,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server host/port")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_repository(
    database: &DatabaseSettings,
) -> anyhow::Result<Arc<dyn ConversationRepository>> {
    match database.provider {
        StoreProvider::Postgres => {
            let pool = create_pool(&database.url, database.max_connections).await?;
            if database.run_migrations {
                run_migrations(&pool).await?;
            }
            Ok(Arc::new(PgConversationRepository::new(pool)))
        }
        StoreProvider::Memory => {
            tracing::warn!("Using in-memory conversation store; history is lost on restart");
            Ok(Arc::new(InMemoryConversationRepository::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
