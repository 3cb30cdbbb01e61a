//! Reputation ledger for DevFlow.
//!
//! A user's reputation is a pure function of their activity history:
//!
//! ```text
//! reputation = clamp(5 * questions
//!                  + 10 * answers
//!                  + 2 * upvotes received on answers
//!                  - 2 * downvotes received on answers
//!                  + 15 * accepted answers, 0, 10_000)
//! ```
//!
//! The formula is the single source of truth. The `users.reputation` column
//! is only a cache: [`recompute_reputation`] overwrites it from a fresh
//! [`ActivityTally`], and every store operation that changes someone's
//! activity calls it for the affected users inside the same transaction.
//! Recomputing twice without new activity yields the same value.

use devflow_types::limits::{
    ACCEPTED_ANSWER_POINTS, ANSWER_POINTS, DOWNVOTE_PENALTY, MAX_REPUTATION, MIN_REPUTATION,
    QUESTION_POINTS, UPVOTE_POINTS,
};
use rusqlite::{params, Connection};
use thiserror::Error;

/// Errors that can occur during reputation operations.
#[derive(Error, Debug)]
pub enum ReputationError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// The user whose reputation was requested does not exist.
    #[error("user not found: {0}")]
    UserNotFound(i64),
}

/// Activity counts that feed the reputation formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTally {
    /// Questions authored.
    pub questions: i64,
    /// Answers authored.
    pub answers: i64,
    /// Upvotes received across all authored answers.
    pub upvotes_received: i64,
    /// Downvotes received across all authored answers.
    pub downvotes_received: i64,
    /// Authored answers currently accepted.
    pub accepted_answers: i64,
}

impl ActivityTally {
    /// Scores this tally, clamped to the reputation bounds.
    pub fn score(&self) -> i64 {
        let raw = QUESTION_POINTS * self.questions
            + ANSWER_POINTS * self.answers
            + UPVOTE_POINTS * self.upvotes_received
            - DOWNVOTE_PENALTY * self.downvotes_received
            + ACCEPTED_ANSWER_POINTS * self.accepted_answers;
        clamp_reputation(raw)
    }
}

/// Clamps a raw score into `[MIN_REPUTATION, MAX_REPUTATION]`.
pub fn clamp_reputation(raw: i64) -> i64 {
    raw.clamp(MIN_REPUTATION, MAX_REPUTATION)
}

/// Counts a user's activity from the question, answer and vote tables.
///
/// Unknown users simply have an all-zero tally.
pub fn tally_activity(conn: &Connection, user_id: i64) -> Result<ActivityTally, ReputationError> {
    let tally = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM questions WHERE user_id = ?1),
            (SELECT COUNT(*) FROM answers WHERE user_id = ?1),
            (SELECT COUNT(*) FROM answer_votes v JOIN answers a ON a.id = v.answer_id
                WHERE a.user_id = ?1 AND v.action = 'upvote'),
            (SELECT COUNT(*) FROM answer_votes v JOIN answers a ON a.id = v.answer_id
                WHERE a.user_id = ?1 AND v.action = 'downvote'),
            (SELECT COUNT(*) FROM answers WHERE user_id = ?1 AND status = 'accepted')",
        params![user_id],
        |row| {
            Ok(ActivityTally {
                questions: row.get(0)?,
                answers: row.get(1)?,
                upvotes_received: row.get(2)?,
                downvotes_received: row.get(3)?,
                accepted_answers: row.get(4)?,
            })
        },
    )?;
    Ok(tally)
}

/// Recomputes a user's reputation from scratch and caches it on the user row.
///
/// Returns the new reputation.
///
/// # Errors
///
/// Returns [`ReputationError::UserNotFound`] if no user has this ID.
pub fn recompute_reputation(conn: &Connection, user_id: i64) -> Result<i64, ReputationError> {
    let reputation = tally_activity(conn, user_id)?.score();
    let updated = conn.execute(
        "UPDATE users SET reputation = ?1 WHERE id = ?2",
        params![reputation, user_id],
    )?;
    if updated == 0 {
        return Err(ReputationError::UserNotFound(user_id));
    }
    tracing::debug!(user_id, reputation, "reputation recomputed");
    Ok(reputation)
}

/// Recomputes reputation for each distinct user in `user_ids`.
pub fn recompute_many(conn: &Connection, user_ids: &[i64]) -> Result<(), ReputationError> {
    let mut seen: Vec<i64> = Vec::with_capacity(user_ids.len());
    for &user_id in user_ids {
        if seen.contains(&user_id) {
            continue;
        }
        seen.push(user_id);
        recompute_reputation(conn, user_id)?;
    }
    Ok(())
}
