//! Style assistant route, mounted under `/api/chat`

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    AppState,
    chat::ChatMessage,
    error::{ApiError, ApiResult},
    rate_limit::chat_rate_limit,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/chat",
        post(chat).route_layer(middleware::from_fn_with_state(
            state.clone(),
            chat_rate_limit,
        )),
    )
}

/// Forward a conversation to the completion API
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat request: {}", rejection.body_text());
        ApiError::InvalidMessages
    })?;

    let response = state.chat_client.generate_response(&request.messages).await?;
    Ok(Json(ChatResponse { response }))
}
