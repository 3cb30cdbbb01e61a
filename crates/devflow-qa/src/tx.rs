//! Transaction and version-stamp helpers shared by the mutating operations.

use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use crate::error::QaError;

/// A versioned table.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Entity {
    Question,
    Answer,
}

impl Entity {
    fn table(self) -> &'static str {
        match self {
            Self::Question => "questions",
            Self::Answer => "answers",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

/// Opens a transaction that takes the write lock up front.
pub(crate) fn begin(conn: &mut Connection) -> Result<Transaction<'_>, QaError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Bumps the entity's version if it still equals `expected`.
///
/// Fails with [`QaError::ConcurrentModification`] when another writer got
/// there first.
pub(crate) fn bump_version(
    conn: &Connection,
    entity: Entity,
    id: i64,
    expected: i64,
) -> Result<(), QaError> {
    let sql = format!(
        "UPDATE {} SET version = version + 1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1 AND version = ?2",
        entity.table()
    );
    let count = conn.execute(&sql, params![id, expected])?;
    if count == 0 {
        tracing::warn!(entity = entity.label(), id, expected, "version stamp mismatch");
        return Err(QaError::ConcurrentModification {
            entity: entity.label(),
            id,
        });
    }
    Ok(())
}
