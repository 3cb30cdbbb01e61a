//! Shared types and constants for the DevFlow Q&A platform.
//!
//! This crate provides the foundational types used across all DevFlow crates:
//! lifecycle statuses for questions and answers, vote directions, notification
//! kinds, the acting-user value threaded through every mutating operation,
//! and the content limits and reputation weights in [`limits`].
//!
//! Every enum here has a canonical lowercase string form that is used both on
//! the wire and in the database, so the storage layer never has to guess.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod limits;

/// Error returned when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLabelError {
    /// The kind of label that failed to parse (e.g. "question status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lifecycle status of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// No answer has been posted yet.
    #[default]
    Pending,
    /// At least one answer has been posted.
    Answered,
}

impl QuestionStatus {
    /// Returns the canonical label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "answered" => Ok(Self::Answered),
            _ => Err(ParseLabelError::new("question status", s)),
        }
    }
}

/// Lifecycle status of an answer.
///
/// At most one answer per question is `Accepted` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    /// Not (or no longer) the chosen solution.
    #[default]
    Pending,
    /// Marked by the question owner as the chosen solution.
    Accepted,
}

impl AnswerStatus {
    /// Returns the canonical label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

impl std::fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnswerStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseLabelError::new("answer status", s)),
        }
    }
}

/// Direction of a vote on a question (`up` / `down` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Returns the canonical label for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Returns the other direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl std::str::FromStr for VoteDirection {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(ParseLabelError::new("vote direction", s)),
        }
    }
}

/// Action recorded for a voter on an answer (`upvote` / `downvote` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Upvote,
    Downvote,
}

impl VoteAction {
    /// Returns the canonical label for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

impl std::fmt::Display for VoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VoteAction {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(Self::Upvote),
            "downvote" => Ok(Self::Downvote),
            _ => Err(ParseLabelError::new("vote action", s)),
        }
    }
}

impl From<VoteAction> for VoteDirection {
    fn from(action: VoteAction) -> Self {
        match action {
            VoteAction::Upvote => Self::Up,
            VoteAction::Downvote => Self::Down,
        }
    }
}

impl From<VoteDirection> for VoteAction {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self::Upvote,
            VoteDirection::Down => Self::Downvote,
        }
    }
}

/// Kinds of inbox notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone answered the recipient's question.
    Answer,
    /// Someone commented on the recipient's content.
    Comment,
    /// Someone mentioned the recipient.
    Mention,
    /// Someone upvoted the recipient's answer.
    Vote,
    /// The recipient's answer was accepted.
    Accept,
}

impl NotificationKind {
    /// Returns the canonical label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Comment => "comment",
            Self::Mention => "mention",
            Self::Vote => "vote",
            Self::Accept => "accept",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "answer" => Ok(Self::Answer),
            "comment" => Ok(Self::Comment),
            "mention" => Ok(Self::Mention),
            "vote" => Ok(Self::Vote),
            "accept" => Ok(Self::Accept),
            _ => Err(ParseLabelError::new("notification kind", s)),
        }
    }
}

/// The authenticated user performing an operation.
///
/// Produced by the HTTP auth layer and passed explicitly into every store
/// operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Database ID of the acting user.
    pub id: i64,
    /// Display name of the acting user.
    pub username: String,
}

impl Actor {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
