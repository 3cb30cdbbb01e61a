//! Answer acceptance.
//!
//! A question has either no accepted answer or exactly one. Accepting an
//! answer demotes whichever answer held the mark before; the partial unique
//! index on `answers(question_id) WHERE status = 'accepted'` backs this up
//! at the storage layer.

use devflow_notify::{notify_best_effort, NewNotification};
use devflow_types::{Actor, AnswerStatus, NotificationKind};
use rusqlite::{params, Connection, OptionalExtension};

use crate::answer::{get_answer, Answer};
use crate::error::QaError;
use crate::tx::{self, Entity};

/// Marks an answer as the accepted one for its question.
///
/// Only the question's author may accept. Accepting the answer that is
/// already accepted changes nothing and sends no notification.
///
/// # Errors
///
/// Returns `QaError::AnswerNotFound`, `QuestionNotFound`, `Forbidden`, or
/// `ConcurrentModification`.
pub fn accept_answer(
    conn: &mut Connection,
    actor: &Actor,
    answer_id: i64,
) -> Result<Answer, QaError> {
    let tx = tx::begin(conn)?;
    let (question_id, author_id, status, version): (i64, i64, String, i64) = tx
        .query_row(
            "SELECT question_id, user_id, status, version FROM answers WHERE id = ?1",
            [answer_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?
        .ok_or(QaError::AnswerNotFound(answer_id))?;

    let (asker_id, title): (i64, String) = tx
        .query_row(
            "SELECT user_id, title FROM questions WHERE id = ?1",
            [question_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(QaError::QuestionNotFound(question_id))?;

    if asker_id != actor.id {
        return Err(QaError::Forbidden(
            "Only question owner can accept answers".to_string(),
        ));
    }

    if status == AnswerStatus::Accepted.as_str() {
        tx.commit()?;
        tracing::debug!(answer_id, question_id, "answer already accepted");
        return get_answer(conn, answer_id);
    }

    let previous_author: Option<i64> = tx
        .query_row(
            "SELECT user_id FROM answers WHERE question_id = ?1 AND status = 'accepted'",
            [question_id],
            |row| row.get(0),
        )
        .optional()?;

    tx.execute(
        "UPDATE answers SET
            status = 'pending',
            version = version + 1,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE question_id = ?1 AND status = 'accepted'",
        [question_id],
    )?;
    tx.execute(
        "UPDATE answers SET status = ?1 WHERE id = ?2",
        params![AnswerStatus::Accepted.as_str(), answer_id],
    )?;
    tx::bump_version(&tx, Entity::Answer, answer_id, version)?;

    let mut affected = vec![author_id];
    affected.extend(previous_author);
    devflow_reputation::recompute_many(&tx, &affected)?;
    tx.commit()?;

    tracing::info!(
        answer_id,
        question_id,
        accepted_by = actor.id,
        replaced_author = ?previous_author,
        "answer accepted"
    );

    notify_best_effort(
        conn,
        &NewNotification {
            recipient_id: author_id,
            sender_id: actor.id,
            kind: NotificationKind::Accept,
            message: format!("Your answer was accepted for: \"{}\"", title),
            question_id: Some(question_id),
            answer_id: Some(answer_id),
        },
    );

    get_answer(conn, answer_id)
}
