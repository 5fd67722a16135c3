//! Fixed-window rate limiter for the chat endpoint

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;

/// Entries are swept once the map grows past this many clients
const SWEEP_THRESHOLD: usize = 10_000;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct WindowEntry {
    /// Requests seen in the current window
    requests: u32,
    /// When the current window opened
    window_start: Instant,
}

/// Per-client request counter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `key`, returning whether it is within the limit
    pub async fn check(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = self.config.window;

        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, entry| now.duration_since(entry.window_start) < window);
        }

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            requests: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.requests = 0;
            entry.window_start = now;
        }

        if entry.requests >= self.config.max_requests {
            return false;
        }

        entry.requests += 1;
        true
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

/// Reject clients that exceeded their chat quota with 429
///
/// Clients are keyed by peer IP, which requires the server to be run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn chat_rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&key).await {
        warn!("Chat rate limit exceeded for {}", key);
        return Err(ApiError::TooManyRequests);
    }

    Ok(next.run(req).await)
}
