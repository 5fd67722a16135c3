use anyhow::Result;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    chat::ChatClient,
    config::AppConfig,
    rate_limit::{RateLimiter, RateLimiterConfig},
    repositories::ProductRepository,
    routes,
    storage::ImageStorage,
};
use auth::{AuthState, jwt::JwtService, repositories::UserRepository};
use common::database::{health_check, init_pool, run_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Coretta Styles API");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let storage = ImageStorage::new(&config.upload_dir);
    storage.init().await?;

    let rate_limiter = RateLimiter::new(RateLimiterConfig::default());
    info!(
        "Chat limited to {} requests per {:?} per client",
        rate_limiter.config().max_requests,
        rate_limiter.config().window
    );

    let state = AppState {
        products: Arc::new(ProductRepository::new(pool.clone())),
        storage,
        chat_client: ChatClient::new(config.chat.clone()),
        rate_limiter,
        auth: AuthState {
            users: Arc::new(UserRepository::new(pool)),
            jwt_service: JwtService::new(config.jwt.clone()),
            admin_secret: config.admin_secret.clone(),
        },
    };

    let app = routes::create_router(state).layer(routes::cors_layer(&config.cors_origins)?);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
