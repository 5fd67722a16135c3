//! Application state shared across handlers

use auth::AuthState;
use axum::extract::FromRef;

use crate::{
    chat::ChatClient, rate_limit::RateLimiter, repositories::DynProductStore,
    storage::ImageStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub products: DynProductStore,
    pub storage: ImageStorage,
    pub chat_client: ChatClient,
    pub rate_limiter: RateLimiter,
    pub auth: AuthState,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}
