use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::application::ports::{IdentityError, IdentityVerifier};
use crate::domain::UserId;

/// Resolves access tokens through the Supabase auth API (`GET /auth/v1/user`).
pub struct SupabaseVerifier {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseVerifier {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidToken),
            status if status.is_success() => {
                let user: AuthUser = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
                if user.id.is_empty() {
                    return Err(IdentityError::InvalidToken);
                }
                Ok(UserId::new(user.id))
            }
            status => Err(IdentityError::Unavailable(format!("HTTP {}", status))),
        }
    }
}
