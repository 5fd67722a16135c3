//! JWT service for token generation and validation
//!
//! Tokens are HS256-signed with a shared secret and carry the user's id and
//! role. There are no refresh tokens and no revocation: a token is honoured
//! until its `exp` passes.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Role, User};

/// Default token lifetime: 7 days
const DEFAULT_TOKEN_EXPIRY: u64 = 604_800;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared signing secret
    pub secret: String,
    /// Token expiration time in seconds
    pub token_expiry: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Signing secret (required)
    /// - `JWT_EXPIRY_SECONDS`: Token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_expiry = std::env::var("JWT_EXPIRY_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Role at the time of issue
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    keys: Arc<Keys>,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let keys = Keys {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
        };
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            keys: Arc::new(keys),
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Generate a signed token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now,
            exp: now + self.token_expiry,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}
