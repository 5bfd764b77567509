use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::application::ports::IdentityError;
use crate::domain::UserId;
use crate::presentation::handlers::ApiError;
use crate::presentation::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// The caller, resolved from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .and_then(|rest| rest.split(' ').next())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid authorization header".to_string())
            })?
            .to_string();

        match state.identity_verifier.verify(&token).await {
            Ok(user_id) => Ok(AuthenticatedUser(user_id)),
            Err(IdentityError::InvalidToken) => Err(ApiError::Unauthorized(
                "Invalid authentication token".to_string(),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Auth verification error");
                Err(ApiError::Unauthorized("Authentication failed".to_string()))
            }
        }
    }
}
