//! Authentication gate middleware
//!
//! [`require_auth`] resolves the bearer token to a stored user and inserts
//! that [`User`] into the request extensions; [`require_admin`] additionally
//! demands the admin role.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::warn;

use crate::{
    AuthState,
    error::{AuthError, AuthResult},
    models::{Role, User},
};

/// Extract and validate the JWT, then load the user it names
async fn authenticate(state: &AuthState, headers: &HeaderMap) -> AuthResult<User> {
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AuthError::Unauthenticated)?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AuthError::Unauthenticated
        })?;

    state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthenticated)
}

/// Require any authenticated user
pub async fn require_auth(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, req.headers()).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Require an authenticated admin
pub async fn require_admin(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, req.headers()).await?;

    if user.role != Role::Admin {
        warn!("User {} denied admin access", user.id);
        return Err(AuthError::AdminRequired);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
