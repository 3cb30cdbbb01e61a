use devflow_types::VoteAction;
use thiserror::Error;

/// Errors that can occur during question and answer operations.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reputation error: {0}")]
    Reputation(#[from] devflow_reputation::ReputationError),
    /// Submitted content failed validation. The message is user-facing.
    #[error("{0}")]
    Validation(String),
    #[error("Question not found")]
    QuestionNotFound(i64),
    #[error("Answer not found")]
    AnswerNotFound(i64),
    /// The actor does not own the entity. The message is user-facing.
    #[error("{0}")]
    Forbidden(String),
    #[error("User has already {0}d this answer.")]
    AlreadyVoted(VoteAction),
    /// The entity's version stamp moved between read and write.
    #[error("{entity} {id} was modified concurrently, retry the request")]
    ConcurrentModification { entity: &'static str, id: i64 },
}
