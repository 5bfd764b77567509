use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::presentation::state::AppState;

use super::api_types::ModelsResponse;

pub async fn models_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ModelsResponse::catalog(&state.default_model_name)),
    )
}
