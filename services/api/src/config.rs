//! Service configuration read from the environment

use anyhow::{Context, Result};
use auth::jwt::JwtConfig;
use common::database::DatabaseConfig;
use std::{env, path::PathBuf};

use crate::chat::ChatConfig;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3002"];

/// Everything the API service needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Directory where product images are stored
    pub upload_dir: PathBuf,
    /// Secret unlocking `/api/auth/register-admin`
    pub admin_secret: Option<String>,
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: Listening port (default: 3001)
    /// - `UPLOAD_DIR`: Image directory (default: `uploads`)
    /// - `ADMIN_SECRET`: Admin registration secret (optional)
    /// - `CORS_ORIGINS`: Comma-separated origins (default: `http://localhost:3000,http://localhost:3002`)
    ///
    /// Database, JWT and chat settings are read by their own `from_env`.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?,
            Err(_) => DEFAULT_PORT,
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string())
            .into();

        let admin_secret = env::var("ADMIN_SECRET").ok().filter(|s| !s.is_empty());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.map(str::to_string).to_vec());

        Ok(Self {
            port,
            upload_dir,
            admin_secret,
            cors_origins,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            chat: ChatConfig::from_env(),
        })
    }
}
