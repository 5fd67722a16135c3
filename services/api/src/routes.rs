//! API service routes

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::AppState;

pub mod chat;
pub mod products;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/test", get(server_test))
        .nest("/api/auth", auth::routes::create_router(state.auth.clone()))
        .nest("/api/products", products::router(&state))
        .nest("/api/chat", chat::router(&state))
        .nest_service("/uploads", ServeDir::new(state.storage.dir()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy allowing credentialed requests from the given origins
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.products.health_check().await.unwrap_or(false);
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "coretta-styles-api",
            "database": database
        })),
    )
}

/// Liveness probe used by the storefront during development
pub async fn server_test() -> impl IntoResponse {
    Json(json!({ "message": "Server is running!" }))
}

pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    info!("404 Not Found: {} {}", method, target);

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Cannot {method} {target}")
        })),
    )
}
