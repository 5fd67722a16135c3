//! Helpers for driving the service over loopback sockets in tests

use auth::{
    AuthState,
    jwt::{JwtConfig, JwtService},
    models::{NewUser, Role},
    repositories::{InMemoryUserRepository, UserStore},
};
use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::Mutex};
use uuid::Uuid;

use crate::{
    AppState,
    chat::{ChatClient, ChatConfig},
    models::{Category, NewProduct, Product},
    rate_limit::{RateLimiter, RateLimiterConfig},
    repositories::{InMemoryProductRepository, ProductStore},
    routes::create_router,
    storage::ImageStorage,
};

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// The full router over in-memory stores and a temporary uploads directory
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub users: Arc<InMemoryUserRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub jwt: JwtService,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let chat = ChatConfig {
            api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            ..ChatConfig::default()
        };
        Self::spawn_with(chat, RateLimiterConfig::default()).await
    }

    pub async fn spawn_with(chat: ChatConfig, limits: RateLimiterConfig) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());
        let jwt = JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            token_expiry: 3600,
        });
        let uploads = tempfile::tempdir().unwrap();

        let state = AppState {
            products: products.clone(),
            storage: ImageStorage::new(uploads.path()),
            chat_client: ChatClient::new(chat),
            rate_limiter: RateLimiter::new(limits),
            auth: AuthState {
                users: users.clone(),
                jwt_service: jwt.clone(),
                admin_secret: None,
            },
        };

        Self {
            addr: serve(create_router(state)).await,
            client: reqwest::Client::new(),
            users,
            products,
            jwt,
            uploads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Create an account with the given role and return a bearer token for it
    pub async fn token_for(&self, role: Role) -> String {
        let user = self
            .users
            .create(&NewUser {
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: String::new(),
                name: "Test".to_string(),
                role,
            })
            .await
            .unwrap();
        self.jwt.generate_token(&user).unwrap()
    }

    pub async fn seed(&self, name: &str, price: f64, category: Category) -> Product {
        self.products
            .create(&NewProduct {
                name: name.to_string(),
                price,
                category,
                image: None,
                description: None,
                stock: 1,
            })
            .await
            .unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

/// Stand-in for the chat-completion API that answers every call the same way
pub struct FakeUpstream {
    addr: SocketAddr,
    last: Arc<Mutex<Option<ReceivedRequest>>>,
}

impl FakeUpstream {
    pub async fn spawn(status: u16, response: Value) -> Self {
        let last = Arc::new(Mutex::new(None));
        let recorder = last.clone();
        let status = StatusCode::from_u16(status).unwrap();

        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let response = response.clone();
                async move {
                    let authorization = headers
                        .get(AUTHORIZATION)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    *recorder.lock().await = Some(ReceivedRequest {
                        authorization,
                        body,
                    });
                    (status, Json(response))
                }
            }),
        );

        Self {
            addr: serve(app).await,
            last,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    pub async fn last_request(&self) -> Option<ReceivedRequest> {
        self.last.lock().await.clone()
    }
}
