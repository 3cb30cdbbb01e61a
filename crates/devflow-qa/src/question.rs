//! Question lifecycle: create, read, owner-only update and delete.

use devflow_types::limits::{MAX_TAG_LEN, MAX_TITLE_LEN, MIN_QUESTION_BODY_LEN, MIN_TITLE_LEN};
use devflow_types::{Actor, QuestionStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::QaError;
use crate::tx::{self, Entity};

/// Base projection for questions. Vote and answer counts are derived.
///
/// Column aliases are stable so callers can wrap this in a subquery and
/// filter on them.
pub(crate) const SELECT_QUESTION: &str = "SELECT
        q.id AS id,
        q.user_id AS user_id,
        u.username AS username,
        u.reputation AS reputation,
        q.title AS title,
        q.body AS body,
        q.tags_json AS tags_json,
        q.status AS status,
        (SELECT COUNT(*) FROM question_votes v
            WHERE v.question_id = q.id AND v.direction = 'up') AS upvotes,
        (SELECT COUNT(*) FROM question_votes v
            WHERE v.question_id = q.id AND v.direction = 'down') AS downvotes,
        q.version AS version,
        q.created_at AS created_at,
        q.updated_at AS updated_at,
        (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answer_count
    FROM questions q
    JOIN users u ON u.id = q.user_id";

/// Public view of a content author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub reputation: i64,
}

/// A question with its derived vote totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "user")]
    pub author: AuthorSummary,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub status: QuestionStatus,
    /// Net total: upvotes minus downvotes.
    pub votes: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: String,
    pub updated_at: String,
    /// Version stamp used for compare-and-swap updates.
    #[serde(skip)]
    pub version: i64,
}

/// Content submitted when asking a question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Owner edit of a question. Title and body are required; absent tags or
/// status keep their current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub tags: Option<Vec<String>>,
    pub status: Option<QuestionStatus>,
}

/// Checks title, body and tags against the content limits.
pub fn validate_question(input: &QuestionInput) -> Result<(), QaError> {
    check_title_and_body(&input.title, &input.body)?;
    normalize_tags(&input.tags)?;
    Ok(())
}

fn check_title_and_body(title: &str, body: &str) -> Result<(), QaError> {
    let title_len = title.trim().chars().count();
    if title_len < MIN_TITLE_LEN {
        return Err(QaError::Validation(format!(
            "Title should be at least {MIN_TITLE_LEN} characters long."
        )));
    }
    if title_len > MAX_TITLE_LEN {
        return Err(QaError::Validation(format!(
            "Title should be at most {MAX_TITLE_LEN} characters long."
        )));
    }
    if body.trim().chars().count() < MIN_QUESTION_BODY_LEN {
        return Err(QaError::Validation(format!(
            "Body should be at least {MIN_QUESTION_BODY_LEN} characters long."
        )));
    }
    Ok(())
}

/// Trims tags and rejects an empty list, blank tags and over-long tags.
fn normalize_tags(tags: &[String]) -> Result<Vec<String>, QaError> {
    if tags.is_empty() {
        return Err(QaError::Validation(
            "At least one tag is required.".to_string(),
        ));
    }
    tags.iter()
        .map(|tag| {
            let tag = tag.trim();
            if tag.is_empty() {
                Err(QaError::Validation("Tags cannot be empty.".to_string()))
            } else if tag.chars().count() > MAX_TAG_LEN {
                Err(QaError::Validation(format!(
                    "Tags should be at most {MAX_TAG_LEN} characters long."
                )))
            } else {
                Ok(tag.to_string())
            }
        })
        .collect()
}

/// Creates a question owned by `actor` and refreshes the actor's reputation.
///
/// # Errors
///
/// Returns `QaError::Validation` if the content breaks a limit.
pub fn create_question(
    conn: &mut Connection,
    actor: &Actor,
    input: &QuestionInput,
) -> Result<Question, QaError> {
    check_title_and_body(&input.title, &input.body)?;
    let tags = normalize_tags(&input.tags)?;
    let tags_json = serde_json::to_string(&tags)?;

    let tx = tx::begin(conn)?;
    tx.execute(
        "INSERT INTO questions (user_id, title, body, tags_json) VALUES (?1, ?2, ?3, ?4)",
        params![actor.id, input.title.trim(), input.body.trim(), tags_json],
    )?;
    let id = tx.last_insert_rowid();
    devflow_reputation::recompute_reputation(&tx, actor.id)?;
    tx.commit()?;

    tracing::info!(question_id = id, user_id = actor.id, "question created");
    get_question(conn, id)
}

/// Retrieves a question with its author and vote totals.
///
/// # Errors
///
/// Returns `QaError::QuestionNotFound` if no question has this ID.
pub fn get_question(conn: &Connection, id: i64) -> Result<Question, QaError> {
    let sql = format!("{SELECT_QUESTION} WHERE q.id = ?1");
    conn.query_row(&sql, [id], map_row_to_question)
        .optional()?
        .ok_or(QaError::QuestionNotFound(id))
}

/// Lists the questions authored by a user, newest first.
pub fn list_questions_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Question>, QaError> {
    let sql = format!("{SELECT_QUESTION} WHERE q.user_id = ?1 ORDER BY q.created_at DESC, q.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([user_id], map_row_to_question)?;

    let mut questions = Vec::new();
    for row in rows {
        questions.push(row?);
    }
    Ok(questions)
}

/// Loads the owner and version of a question inside a transaction.
pub(crate) fn owner_and_version(conn: &Connection, id: i64) -> Result<(i64, i64), QaError> {
    conn.query_row(
        "SELECT user_id, version FROM questions WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or(QaError::QuestionNotFound(id))
}

/// Applies an owner edit.
///
/// # Errors
///
/// Returns `QaError::Validation` for bad content, `QuestionNotFound`,
/// `Forbidden` if `actor` is not the author, or `ConcurrentModification`.
pub fn update_question(
    conn: &mut Connection,
    actor: &Actor,
    id: i64,
    update: &QuestionUpdate,
) -> Result<Question, QaError> {
    check_title_and_body(&update.title, &update.body)?;
    let tags_json = update
        .tags
        .as_deref()
        .map(normalize_tags)
        .transpose()?
        .map(|tags| serde_json::to_string(&tags))
        .transpose()?;

    let tx = tx::begin(conn)?;
    let (owner_id, version) = owner_and_version(&tx, id)?;
    if owner_id != actor.id {
        return Err(QaError::Forbidden(
            "You are not authorized to update this question".to_string(),
        ));
    }

    tx.execute(
        "UPDATE questions SET
            title = ?1,
            body = ?2,
            tags_json = COALESCE(?3, tags_json),
            status = COALESCE(?4, status)
         WHERE id = ?5",
        params![
            update.title.trim(),
            update.body.trim(),
            tags_json,
            update.status.map(QuestionStatus::as_str),
            id,
        ],
    )?;
    tx::bump_version(&tx, Entity::Question, id, version)?;
    tx.commit()?;

    tracing::info!(question_id = id, user_id = actor.id, "question updated");
    get_question(conn, id)
}

/// Deletes a question with its answers and votes.
///
/// The author and every answerer lose the activity that lived under this
/// question, so their reputation is recomputed before commit.
///
/// # Errors
///
/// Returns `QaError::QuestionNotFound` or `Forbidden`.
pub fn delete_question(conn: &mut Connection, actor: &Actor, id: i64) -> Result<(), QaError> {
    let tx = tx::begin(conn)?;
    let (owner_id, _) = owner_and_version(&tx, id)?;
    if owner_id != actor.id {
        return Err(QaError::Forbidden(
            "You are not authorized to delete this question".to_string(),
        ));
    }

    let mut affected = vec![owner_id];
    {
        let mut stmt = tx.prepare("SELECT DISTINCT user_id FROM answers WHERE question_id = ?1")?;
        let rows = stmt.query_map([id], |row| row.get::<_, i64>(0))?;
        for row in rows {
            affected.push(row?);
        }
    }

    // Explicit so the result does not depend on the foreign_keys pragma.
    tx.execute(
        "UPDATE notifications SET question_id = NULL, answer_id = NULL
         WHERE question_id = ?1
            OR answer_id IN (SELECT id FROM answers WHERE question_id = ?1)",
        [id],
    )?;
    tx.execute(
        "DELETE FROM answer_votes
         WHERE answer_id IN (SELECT id FROM answers WHERE question_id = ?1)",
        [id],
    )?;
    tx.execute("DELETE FROM answers WHERE question_id = ?1", [id])?;
    tx.execute("DELETE FROM question_votes WHERE question_id = ?1", [id])?;
    tx.execute("DELETE FROM questions WHERE id = ?1", [id])?;

    devflow_reputation::recompute_many(&tx, &affected)?;
    tx.commit()?;

    tracing::info!(question_id = id, user_id = actor.id, "question deleted");
    Ok(())
}

pub(crate) fn map_row_to_question(row: &Row) -> rusqlite::Result<Question> {
    let tags_json: String = row.get(6)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status_str: String = row.get(7)?;
    let status: QuestionStatus = status_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let upvotes: i64 = row.get(8)?;
    let downvotes: i64 = row.get(9)?;
    let user_id: i64 = row.get(1)?;

    Ok(Question {
        id: row.get(0)?,
        user_id,
        author: AuthorSummary {
            id: user_id,
            username: row.get(2)?,
            reputation: row.get(3)?,
        },
        title: row.get(4)?,
        body: row.get(5)?,
        tags,
        status,
        votes: upvotes - downvotes,
        upvotes,
        downvotes,
        version: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
