//! In-memory user store for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a reset token's expiry, e.g. to simulate the clock passing it
    pub async fn expire_reset_token(&self, id: Uuid, expires_at: DateTime<Utc>) {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.reset_password_expires = Some(expires_at);
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            name: new_user.name.clone(),
            role: new_user.role,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.reset_password_token = Some(token.to_string());
            user.reset_password_expires = Some(expires_at);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reset_password(
        &self,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> DatabaseResult<Option<User>> {
        let mut users = self.users.write().await;
        let user = users.values_mut().find(|u| {
            u.reset_password_token.as_deref() == Some(token)
                && u.reset_password_expires.is_some_and(|expires| expires > now)
        });

        Ok(user.map(|user| {
            user.password_hash = password_hash.to_string();
            user.reset_password_token = None;
            user.reset_password_expires = None;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}
