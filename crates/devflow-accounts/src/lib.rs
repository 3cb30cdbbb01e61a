//! User accounts for DevFlow.
//!
//! Covers registration (with field validation), Argon2 password hashing,
//! HS256 session tokens, login, and profile lookups. Login and profile reads
//! refresh the cached reputation through `devflow-reputation` before
//! returning the user.

pub mod password;
pub mod token;
mod users;

use thiserror::Error;

pub use token::{Claims, TokenService};
pub use users::{
    authenticate, find_user_by_email, get_user, get_user_refreshed, list_users, register_user,
    validate_registration, Registration, User,
};

/// Errors produced by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A submitted field failed validation.
    #[error("{0}")]
    Validation(String),
    /// Another account already uses this email address.
    #[error("User already exists with this email.")]
    EmailTaken,
    /// Another account already uses this username.
    #[error("Username is already taken.")]
    UsernameTaken,
    /// Unknown email or wrong password.
    #[error("Invalid email or password.")]
    InvalidCredentials,
    /// No user has the given ID.
    #[error("user not found: {0}")]
    NotFound(i64),
    /// The presented token is missing, malformed, expired, or forged.
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    /// Token signing failed.
    #[error("token signing failed: {0}")]
    TokenSigning(String),
    /// A database error occurred.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    /// Reputation refresh failed.
    #[error(transparent)]
    Reputation(#[from] devflow_reputation::ReputationError),
}
