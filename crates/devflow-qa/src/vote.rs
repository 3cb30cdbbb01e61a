//! Vote ledgers for questions and answers.
//!
//! Each ledger keeps one row per (entity, voter), so a voter can never be
//! counted in both directions. Questions use toggle semantics: repeating a
//! vote retracts it. Answers use switch semantics: repeating a vote is a
//! conflict and there is no way back to neutral.

use devflow_notify::{notify_best_effort, NewNotification};
use devflow_types::{Actor, NotificationKind, VoteAction, VoteDirection};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::answer::{get_answer, Answer};
use crate::error::QaError;
use crate::question::owner_and_version;
use crate::tx::{self, Entity};

/// Result of a question vote, from the voter's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVoteOutcome {
    /// Net total after the vote.
    pub votes: i64,
    pub has_upvoted: bool,
    pub has_downvoted: bool,
}

/// Applies a question vote.
///
/// | prior | vote | effect |
/// |-------|------|--------|
/// | none  | d    | record d |
/// | d     | d    | retract |
/// | d     | !d   | switch to !d |
///
/// # Errors
///
/// Returns `QaError::QuestionNotFound` or `ConcurrentModification`.
pub fn vote_question(
    conn: &mut Connection,
    actor: &Actor,
    question_id: i64,
    direction: VoteDirection,
) -> Result<QuestionVoteOutcome, QaError> {
    let tx = tx::begin(conn)?;
    let (_, version) = owner_and_version(&tx, question_id)?;

    let prior: Option<String> = tx
        .query_row(
            "SELECT direction FROM question_votes WHERE question_id = ?1 AND user_id = ?2",
            params![question_id, actor.id],
            |row| row.get(0),
        )
        .optional()?;
    let prior = prior
        .map(|d| d.parse::<VoteDirection>())
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    match prior {
        Some(existing) if existing == direction => {
            tx.execute(
                "DELETE FROM question_votes WHERE question_id = ?1 AND user_id = ?2",
                params![question_id, actor.id],
            )?;
        }
        Some(_) => {
            tx.execute(
                "UPDATE question_votes SET direction = ?1 WHERE question_id = ?2 AND user_id = ?3",
                params![direction.as_str(), question_id, actor.id],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO question_votes (question_id, user_id, direction) VALUES (?1, ?2, ?3)",
                params![question_id, actor.id, direction.as_str()],
            )?;
        }
    }
    tx::bump_version(&tx, Entity::Question, question_id, version)?;

    let outcome = tx.query_row(
        "SELECT
            COALESCE(SUM(CASE direction WHEN 'up' THEN 1 ELSE -1 END), 0),
            COALESCE(SUM(user_id = ?2 AND direction = 'up'), 0),
            COALESCE(SUM(user_id = ?2 AND direction = 'down'), 0)
         FROM question_votes WHERE question_id = ?1",
        params![question_id, actor.id],
        |row| {
            Ok(QuestionVoteOutcome {
                votes: row.get(0)?,
                has_upvoted: row.get::<_, i64>(1)? > 0,
                has_downvoted: row.get::<_, i64>(2)? > 0,
            })
        },
    )?;
    tx.commit()?;

    tracing::debug!(
        question_id,
        user_id = actor.id,
        direction = direction.as_str(),
        votes = outcome.votes,
        "question vote applied"
    );
    Ok(outcome)
}

/// Applies an answer vote and refreshes the answer author's reputation.
///
/// A fresh vote is recorded; a vote opposite to the standing one switches
/// it; a repeat of the standing one fails. Every successful upvote notifies
/// the answer's author.
///
/// # Errors
///
/// Returns `QaError::AnswerNotFound`, `AlreadyVoted`, or
/// `ConcurrentModification`.
pub fn vote_answer(
    conn: &mut Connection,
    actor: &Actor,
    answer_id: i64,
    action: VoteAction,
) -> Result<Answer, QaError> {
    let tx = tx::begin(conn)?;
    let (question_id, author_id, version): (i64, i64, i64) = tx
        .query_row(
            "SELECT question_id, user_id, version FROM answers WHERE id = ?1",
            [answer_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or(QaError::AnswerNotFound(answer_id))?;

    let prior: Option<String> = tx
        .query_row(
            "SELECT action FROM answer_votes WHERE answer_id = ?1 AND user_id = ?2",
            params![answer_id, actor.id],
            |row| row.get(0),
        )
        .optional()?;
    let prior = prior
        .map(|a| a.parse::<VoteAction>())
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    match prior {
        Some(existing) if existing == action => {
            return Err(QaError::AlreadyVoted(action));
        }
        Some(_) => {
            tx.execute(
                "UPDATE answer_votes SET action = ?1 WHERE answer_id = ?2 AND user_id = ?3",
                params![action.as_str(), answer_id, actor.id],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO answer_votes (answer_id, user_id, action) VALUES (?1, ?2, ?3)",
                params![answer_id, actor.id, action.as_str()],
            )?;
        }
    }
    tx::bump_version(&tx, Entity::Answer, answer_id, version)?;
    devflow_reputation::recompute_reputation(&tx, author_id)?;
    tx.commit()?;

    tracing::debug!(
        answer_id,
        user_id = actor.id,
        action = action.as_str(),
        switched = prior.is_some(),
        "answer vote applied"
    );

    if action == VoteAction::Upvote {
        notify_best_effort(
            conn,
            &NewNotification {
                recipient_id: author_id,
                sender_id: actor.id,
                kind: NotificationKind::Vote,
                message: "Someone upvoted your answer".to_string(),
                question_id: Some(question_id),
                answer_id: Some(answer_id),
            },
        );
    }

    get_answer(conn, answer_id)
}
