//! Connection setup for the DevFlow store.
//!
//! Every connection the store touches, pooled or opened directly, goes
//! through [`prepare_connection`]: WAL journaling so readers never wait on
//! the single writer, foreign keys, a busy timeout long enough for
//! `BEGIN IMMEDIATE` to queue behind another writer, and the
//! [`FOLD_CASE_FUNCTION`] used by case-insensitive search.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Name of the SQL function that lowercases text with full Unicode rules.
///
/// SQLite's built-in `lower()` only folds ASCII, so `lower('É')` stays `'É'`.
/// Search compares `devflow_fold(column)` against a query lowercased with
/// [`str::to_lowercase`], so both sides fold the same way.
pub const FOLD_CASE_FUNCTION: &str = "devflow_fold";

/// Tunables applied to every store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits for the lock before failing, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on pooled connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// The SQLite connection pool shared by every request handler.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Applies pragmas and registers DevFlow's SQL functions on `conn`.
///
/// # Errors
///
/// Fails if a pragma is rejected, the journal cannot be switched to WAL, or
/// the function cannot be registered.
pub fn prepare_connection(conn: &Connection, settings: &DbRuntimeSettings) -> rusqlite::Result<()> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    // Private in-memory databases cannot use WAL and say so.
    if !matches!(journal_mode.as_str(), "wal" | "memory") {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal mode stuck at {journal_mode}")),
        ));
    }

    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(std::time::Duration::from_millis(settings.busy_timeout_ms))?;

    conn.create_scalar_function(
        FOLD_CASE_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Creates the store's connection pool at `db_path`.
///
/// `:memory:` is accepted, but each pooled connection then opens its own
/// private database, so it only makes sense with `pool_max_size = 1`.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the first connections cannot be opened
/// and prepared.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| prepare_connection(conn, &settings));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "database pool created"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_connections_are_prepared() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("devflow.db");
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 3,
        };

        let pool = create_pool(path.to_str().expect("utf-8 path"), settings)
            .expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert_eq!(mode, "wal");

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1);

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500);

        assert_eq!(pool.max_size(), 3);
    }

    #[test]
    fn fold_case_lowercases_beyond_ascii() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        prepare_connection(&conn, &DbRuntimeSettings::default()).expect("should prepare");

        let (folded, builtin): (String, String) = conn
            .query_row(
                &format!("SELECT {FOLD_CASE_FUNCTION}('ÉCRIRE Straße'), lower('ÉCRIRE')"),
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("should call fold function");
        assert_eq!(folded, "écrire straße");
        assert_eq!(builtin, "Écrire");

        let null: Option<String> = conn
            .query_row(&format!("SELECT {FOLD_CASE_FUNCTION}(NULL)"), [], |row| row.get(0))
            .expect("should fold NULL");
        assert_eq!(null, None);
    }

    #[test]
    fn in_memory_connection_reports_memory_journal() {
        let settings = DbRuntimeSettings {
            pool_max_size: 1,
            ..DbRuntimeSettings::default()
        };
        let pool = create_pool(":memory:", settings).expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert_eq!(mode, "memory");
    }
}
