//! Coretta Styles storefront API
//!
//! Product catalog CRUD with image uploads, the identity endpoints from the
//! `auth` crate, and a proxy to a chat-completion API for the style assistant.

pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use state::AppState;
