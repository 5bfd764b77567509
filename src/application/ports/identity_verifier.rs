use async_trait::async_trait;

use crate::domain::UserId;

/// Maps a bearer token to the user it was issued for.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid token")]
    InvalidToken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}
