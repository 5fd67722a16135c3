//! Identity store
//!
//! Handlers talk to users through [`UserStore`] so the PostgreSQL
//! implementation can be swapped for the in-memory one in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{NewUser, User};

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod user;

#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryUserRepository;
pub use user::UserRepository;

/// Shared handle to a user store
pub type DynUserStore = Arc<dyn UserStore>;

/// Persistence operations over user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken email fails with `DatabaseError::Duplicate`
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Look a user up by (normalized) email
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Look a user up by id
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Record a password-reset token and its expiry on the user
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<()>;

    /// Consume a reset token
    ///
    /// Succeeds only when `token` matches a user whose token expires after
    /// `now`; the password hash is replaced and the token cleared in the same
    /// write, so a token can authorize at most one reset.
    async fn reset_password(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> DatabaseResult<Option<User>>;
}
