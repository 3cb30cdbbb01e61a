//! Answers and their voter records.

use devflow_notify::{notify_best_effort, NewNotification};
use devflow_types::limits::MIN_ANSWER_BODY_LEN;
use devflow_types::{Actor, AnswerStatus, NotificationKind, QuestionStatus, VoteAction};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::QaError;
use crate::question::AuthorSummary;
use crate::tx::{self, Entity};

const SELECT_ANSWER: &str = "SELECT
        a.id, a.question_id, a.user_id, u.username, u.reputation, a.body, a.status,
        (SELECT COUNT(*) FROM answer_votes v
            WHERE v.answer_id = a.id AND v.action = 'upvote'),
        (SELECT COUNT(*) FROM answer_votes v
            WHERE v.answer_id = a.id AND v.action = 'downvote'),
        a.version, a.created_at, a.updated_at
    FROM answers a
    JOIN users u ON u.id = a.user_id";

/// One user's standing vote on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRecord {
    pub user_id: i64,
    pub action: VoteAction,
}

/// An answer with its voter records and the counters derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub user_id: i64,
    #[serde(rename = "user")]
    pub author: AuthorSummary,
    pub body: String,
    pub status: AnswerStatus,
    pub upvotes: i64,
    pub downvotes: i64,
    pub voters: Vec<VoterRecord>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip)]
    pub version: i64,
}

/// An answer submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub body: String,
}

/// Posts an answer, marks the question answered and notifies its author.
///
/// # Errors
///
/// Returns `QaError::Validation` for a short body, `QuestionNotFound` if the
/// question does not exist, or `ConcurrentModification`.
pub fn post_answer(
    conn: &mut Connection,
    actor: &Actor,
    new: &NewAnswer,
) -> Result<Answer, QaError> {
    if new.body.trim().chars().count() < MIN_ANSWER_BODY_LEN {
        return Err(QaError::Validation(format!(
            "Answer should be at least {MIN_ANSWER_BODY_LEN} characters long."
        )));
    }

    let tx = tx::begin(conn)?;
    let (asker_id, title, version): (i64, String, i64) = tx
        .query_row(
            "SELECT user_id, title, version FROM questions WHERE id = ?1",
            [new.question_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or(QaError::QuestionNotFound(new.question_id))?;

    tx.execute(
        "INSERT INTO answers (question_id, user_id, body) VALUES (?1, ?2, ?3)",
        params![new.question_id, actor.id, new.body.trim()],
    )?;
    let answer_id = tx.last_insert_rowid();

    tx.execute(
        "UPDATE questions SET status = ?1 WHERE id = ?2",
        params![QuestionStatus::Answered.as_str(), new.question_id],
    )?;
    tx::bump_version(&tx, Entity::Question, new.question_id, version)?;
    devflow_reputation::recompute_reputation(&tx, actor.id)?;
    tx.commit()?;

    tracing::info!(
        answer_id,
        question_id = new.question_id,
        user_id = actor.id,
        "answer posted"
    );

    notify_best_effort(
        conn,
        &NewNotification {
            recipient_id: asker_id,
            sender_id: actor.id,
            kind: NotificationKind::Answer,
            message: format!("{} answered your question: \"{}\"", actor.username, title),
            question_id: Some(new.question_id),
            answer_id: Some(answer_id),
        },
    );

    get_answer(conn, answer_id)
}

/// Retrieves an answer with its voters.
///
/// # Errors
///
/// Returns `QaError::AnswerNotFound` if no answer has this ID.
pub fn get_answer(conn: &Connection, id: i64) -> Result<Answer, QaError> {
    let sql = format!("{SELECT_ANSWER} WHERE a.id = ?1");
    let mut answer = conn
        .query_row(&sql, [id], map_row_to_answer)
        .optional()?
        .ok_or(QaError::AnswerNotFound(id))?;
    answer.voters = load_voters(conn, id)?;
    Ok(answer)
}

/// Lists the answers to a question, newest first.
pub fn list_answers(conn: &Connection, question_id: i64) -> Result<Vec<Answer>, QaError> {
    query_answers(conn, "a.question_id = ?1", question_id)
}

/// Lists the answers written by a user, newest first.
pub fn list_answers_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Answer>, QaError> {
    query_answers(conn, "a.user_id = ?1", user_id)
}

fn query_answers(conn: &Connection, predicate: &str, key: i64) -> Result<Vec<Answer>, QaError> {
    let sql = format!("{SELECT_ANSWER} WHERE {predicate} ORDER BY a.created_at DESC, a.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([key], map_row_to_answer)?;

    let mut answers = Vec::new();
    for row in rows {
        let mut answer = row?;
        answer.voters = load_voters(conn, answer.id)?;
        answers.push(answer);
    }
    Ok(answers)
}

/// Loads voter records in the order the voters first voted.
pub(crate) fn load_voters(conn: &Connection, answer_id: i64) -> Result<Vec<VoterRecord>, QaError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, action FROM answer_votes WHERE answer_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([answer_id], |row| {
        let action_str: String = row.get(1)?;
        let action: VoteAction = action_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(VoterRecord {
            user_id: row.get(0)?,
            action,
        })
    })?;

    let mut voters = Vec::new();
    for row in rows {
        voters.push(row?);
    }
    Ok(voters)
}

fn map_row_to_answer(row: &Row) -> rusqlite::Result<Answer> {
    let status_str: String = row.get(6)?;
    let status: AnswerStatus = status_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let user_id: i64 = row.get(2)?;

    Ok(Answer {
        id: row.get(0)?,
        question_id: row.get(1)?,
        user_id,
        author: AuthorSummary {
            id: user_id,
            username: row.get(3)?,
            reputation: row.get(4)?,
        },
        body: row.get(5)?,
        status,
        upvotes: row.get(7)?,
        downvotes: row.get(8)?,
        voters: Vec::new(),
        version: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
