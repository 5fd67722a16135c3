//! Identity models

pub mod user;

pub use user::{NewUser, Role, User, UserResponse, normalize_email};
