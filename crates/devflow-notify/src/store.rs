//! Persistence operations for the notification inbox.
//!
//! All writes go through [`notify`], which drops self-notifications before
//! touching the database. Reads join the sender's username and the referenced
//! question's title so the inbox can be rendered without extra lookups.

use devflow_types::NotificationKind;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::NotifyError;

const SELECT_NOTIFICATION: &str = "SELECT
        n.id, n.recipient_id, n.sender_id, u.username, n.kind, n.message,
        n.question_id, q.title, n.answer_id, n.read, n.created_at
    FROM notifications n
    LEFT JOIN users u ON u.id = n.sender_id
    LEFT JOIN questions q ON q.id = n.question_id";

/// A stored inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: i64,
    /// Username of the sender, if the sender still exists.
    pub sender_username: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub question_id: Option<i64>,
    /// Title of the referenced question, if any.
    pub question_title: Option<String>,
    pub answer_id: Option<i64>,
    pub read: bool,
    pub created_at: String,
}

/// Parameters for emitting a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub sender_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub question_id: Option<i64>,
    pub answer_id: Option<i64>,
}

/// Creates an unread notification for the recipient.
///
/// Returns `Ok(None)` without writing anything when the recipient is the
/// sender.
///
/// # Errors
///
/// Returns `NotifyError::Database` on SQL failure.
pub fn notify(
    conn: &Connection,
    new: &NewNotification,
) -> Result<Option<Notification>, NotifyError> {
    if new.recipient_id == new.sender_id {
        tracing::trace!(
            user_id = new.sender_id,
            kind = new.kind.as_str(),
            "suppressing self-notification"
        );
        return Ok(None);
    }

    conn.execute(
        "INSERT INTO notifications
            (recipient_id, sender_id, kind, message, question_id, answer_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.recipient_id,
            new.sender_id,
            new.kind.as_str(),
            new.message,
            new.question_id,
            new.answer_id,
        ],
    )?;
    let id = conn.last_insert_rowid();

    get_notification(conn, new.recipient_id, id).map(Some)
}

/// Like [`notify`], but logs failures instead of returning them.
///
/// Used by store operations whose success must not depend on the inbox.
pub fn notify_best_effort(conn: &Connection, new: &NewNotification) -> Option<Notification> {
    match notify(conn, new) {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(
                recipient_id = new.recipient_id,
                sender_id = new.sender_id,
                kind = new.kind.as_str(),
                "failed to create notification: {}",
                e
            );
            None
        }
    }
}

/// Fetches a single notification owned by `recipient_id`.
///
/// # Errors
///
/// Returns `NotifyError::NotFound` if it does not exist or belongs to
/// someone else.
pub fn get_notification(
    conn: &Connection,
    recipient_id: i64,
    notification_id: i64,
) -> Result<Notification, NotifyError> {
    let sql = format!("{SELECT_NOTIFICATION} WHERE n.id = ?1 AND n.recipient_id = ?2");
    conn.query_row(&sql, params![notification_id, recipient_id], map_row)
        .optional()?
        .ok_or(NotifyError::NotFound(notification_id))
}

/// Lists the recipient's most recent notifications, newest first.
pub fn list_recent(
    conn: &Connection,
    recipient_id: i64,
    limit: u32,
) -> Result<Vec<Notification>, NotifyError> {
    let sql = format!(
        "{SELECT_NOTIFICATION}
         WHERE n.recipient_id = ?1
         ORDER BY n.created_at DESC, n.id DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![recipient_id, limit], map_row)?;

    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(row?);
    }
    Ok(notifications)
}

/// Marks one of the recipient's notifications as read.
///
/// # Errors
///
/// Returns `NotifyError::NotFound` if the notification does not exist or
/// belongs to another recipient.
pub fn mark_read(
    conn: &Connection,
    recipient_id: i64,
    notification_id: i64,
) -> Result<(), NotifyError> {
    let count = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
        params![notification_id, recipient_id],
    )?;
    if count == 0 {
        return Err(NotifyError::NotFound(notification_id));
    }
    Ok(())
}

/// Marks all of the recipient's unread notifications as read.
///
/// Returns the number of notifications that changed.
pub fn mark_all_read(conn: &Connection, recipient_id: i64) -> Result<usize, NotifyError> {
    let count = conn.execute(
        "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
        [recipient_id],
    )?;
    Ok(count)
}

/// Counts the recipient's unread notifications.
pub fn unread_count(conn: &Connection, recipient_id: i64) -> Result<i64, NotifyError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
        [recipient_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn map_row(row: &Row) -> rusqlite::Result<Notification> {
    let kind_str: String = row.get(4)?;
    let kind: NotificationKind = kind_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Notification {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_username: row.get(3)?,
        kind,
        message: row.get(5)?,
        question_id: row.get(6)?,
        question_title: row.get(7)?,
        answer_id: row.get(8)?,
        read: row.get(9)?,
        created_at: row.get(10)?,
    })
}
