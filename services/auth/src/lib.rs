//! Identity for the Coretta Styles storefront
//!
//! Accounts, password hashing, JWT issuance, the bearer-token gate used by
//! the catalog routes, and the `/api/auth` endpoints.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod reset;
pub mod routes;
pub mod validation;

use crate::{jwt::JwtService, repositories::DynUserStore};

/// State shared by the identity handlers and the authentication gate
#[derive(Clone)]
pub struct AuthState {
    pub users: DynUserStore,
    pub jwt_service: JwtService,
    /// Secret required by `/register-admin`; admin registration is closed when unset
    pub admin_secret: Option<String>,
}
