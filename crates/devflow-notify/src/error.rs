//! Error types for the notification inbox.

/// Errors that can occur during notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A database operation failed.
    #[error("notification database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The notification does not exist or belongs to another recipient.
    #[error("notification not found: {0}")]
    NotFound(i64),
}
