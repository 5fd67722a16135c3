//! Identity API routes, mounted under `/api/auth`

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use common::error::DatabaseError;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::{
    AuthState,
    error::{AuthError, AuthResult},
    middleware::require_auth,
    models::{NewUser, Role, User, UserResponse, normalize_email},
    password::{hash_password, verify_password},
    reset::{generate_reset_token, reset_token_ttl},
    validation::{validate_password, validate_registration},
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request for admin registration
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub secret_key: String,
}

/// Request for user login
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Set by the admin console's login form
    #[serde(default)]
    pub is_admin: bool,
}

/// Request for starting a password reset
#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request for completing a password reset
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Response for registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Create the router for the identity API
pub fn create_router<S>(state: AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let me_route = get(me).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_auth,
    ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/register-admin", post(register_admin))
        .route("/reset-password-request", post(request_password_reset))
        .route("/reset-password", post(reset_password))
        .route("/me", me_route)
        .with_state(state)
}

fn issue_token(state: &AuthState, user: &User) -> AuthResult<String> {
    state.jwt_service.generate_token(user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::Internal
    })
}

/// Hash the password and insert the account, refusing taken emails
async fn create_account(
    state: &AuthState,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> AuthResult<User> {
    if state.users.find_by_email(email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(password).map_err(|e| {
        error!("{}", e);
        AuthError::Internal
    })?;

    let new_user = NewUser {
        email: email.to_string(),
        password_hash,
        name: name.trim().to_string(),
        role,
    };

    // The store's unique index settles races between concurrent registrations.
    state.users.create(&new_user).await.map_err(|e| match e {
        DatabaseError::Duplicate(_) => AuthError::EmailTaken,
        other => AuthError::Database(other),
    })
}

/// User registration endpoint; always creates a regular user
pub async fn register(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Registration request for {}", email);

    validate_registration(&email, &payload.password, &payload.name)
        .map_err(AuthError::Validation)?;

    let user = create_account(&state, &email, &payload.password, &payload.name, Role::User).await?;
    let token = issue_token(&state, &user)?;

    let response = AuthResponse {
        user: UserResponse::from(&user),
        token,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Login attempt for {}", email);

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!("Stored hash for user {} is unusable: {}", user.id, e);
        AuthError::Internal
    })?;

    if !valid {
        warn!("Wrong password for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    if payload.is_admin && user.role != Role::Admin {
        return Err(AuthError::NotAnAdmin);
    }

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

/// An unset or empty configured secret never matches
fn admin_secret_matches(expected: Option<&str>, provided: &str) -> bool {
    expected.is_some_and(|secret| {
        !secret.is_empty() && bool::from(secret.as_bytes().ct_eq(provided.as_bytes()))
    })
}

/// Admin registration endpoint, unlocked by the shared admin secret
pub async fn register_admin(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterAdminRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    if !admin_secret_matches(state.admin_secret.as_deref(), &payload.secret_key) {
        warn!("Admin registration with an invalid secret key");
        return Err(AuthError::InvalidAdminSecret);
    }

    let email = normalize_email(&payload.email);
    validate_registration(&email, &payload.password, &payload.name)
        .map_err(AuthError::Validation)?;

    let admin =
        create_account(&state, &email, &payload.password, &payload.name, Role::Admin).await?;
    info!("Admin account {} created", admin.id);

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Admin account created successfully"),
    ))
}

/// Issue a reset token valid for one hour
///
/// The token is stored on the account; delivering it to the user happens
/// out of band.
pub async fn request_password_reset(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<PasswordResetRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let token = generate_reset_token();
    let expires_at = Utc::now() + reset_token_ttl();
    state
        .users
        .set_reset_token(user.id, &token, expires_at)
        .await?;

    info!("Password reset requested for user {}", user.id);
    Ok(MessageResponse::new(
        "Password reset instructions sent to email",
    ))
}

/// Consume a reset token and set the new password
pub async fn reset_password(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<ResetPasswordRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    if payload.token.is_empty() {
        return Err(AuthError::InvalidResetToken);
    }

    validate_password(&payload.new_password).map_err(AuthError::Validation)?;

    let password_hash = hash_password(&payload.new_password).map_err(|e| {
        error!("{}", e);
        AuthError::Internal
    })?;

    let user = state
        .users
        .reset_password(&payload.token, Utc::now(), &password_hash)
        .await?
        .ok_or(AuthError::InvalidResetToken)?;

    info!("Password reset completed for user {}", user.id);
    Ok(MessageResponse::new("Password reset successful"))
}

/// Current user endpoint
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
