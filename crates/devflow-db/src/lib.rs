//! Database layer for DevFlow.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table DevFlow reads or writes is created
//! through the versioned migrations in this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: readers never block the single writer, and
//!   mutating store operations take an `IMMEDIATE` transaction so writers are
//!   serialized per database.
//! - **`r2d2` connection pool**: bounded connection reuse for the blocking
//!   tasks spawned by HTTP handlers.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema ships with the code that depends on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{
    create_pool, prepare_connection, DbPool, DbRuntimeSettings, PoolError, FOLD_CASE_FUNCTION,
};
