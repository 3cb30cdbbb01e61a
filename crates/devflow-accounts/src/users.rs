//! User registry.
//!
//! Manages the `users` table: registration, credential checks, and profile
//! lookups. The `reputation` column is a cache owned by `devflow-reputation`;
//! reads that promise a fresh value recompute it first.

use devflow_types::limits::{MAX_USERNAME_LEN, MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::password::{hash_password, verify_password};
use crate::AccountError;

/// A user record, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub reputation: i64,
    pub date_joined: String,
}

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Validates registration input without touching the database.
///
/// # Errors
///
/// Returns `AccountError::Validation` naming the first failing field.
pub fn validate_registration(input: &Registration) -> Result<(), AccountError> {
    if input.username.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty()
    {
        return Err(AccountError::Validation(
            "All fields are required.".to_string(),
        ));
    }

    let name_len = input.username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&name_len) {
        return Err(AccountError::Validation(format!(
            "Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters."
        )));
    }
    if !is_valid_email(&input.email) {
        return Err(AccountError::Validation(
            "Please provide a valid email address.".to_string(),
        ));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }
    Ok(())
}

/// `local@domain.tld`, with a 2 to 4 letter TLD.
static EMAIL_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,4}$").expect("invalid email pattern")
});

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Registers a new user with a hashed password.
///
/// # Errors
///
/// Returns `AccountError::Validation` for bad input, `EmailTaken` or
/// `UsernameTaken` for duplicates.
pub fn register_user(conn: &Connection, input: &Registration) -> Result<User, AccountError> {
    validate_registration(input)?;

    if find_user_by_email(conn, &input.email)?.is_some() {
        return Err(AccountError::EmailTaken);
    }
    let name_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [&input.username],
        |row| row.get(0),
    )?;
    if name_taken {
        return Err(AccountError::UsernameTaken);
    }

    let password_hash = hash_password(&input.password)?;

    // The UNIQUE constraints still decide concurrent registrations.
    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![input.username, input.email, password_hash],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, Some(ref msg))
            if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
        {
            if msg.contains("users.email") {
                AccountError::EmailTaken
            } else {
                AccountError::UsernameTaken
            }
        }
        other => AccountError::DatabaseError(other),
    })?;

    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, username = %input.username, "user registered");
    get_user(conn, id)
}

/// Checks credentials and returns the user with freshly recomputed reputation.
///
/// # Errors
///
/// Returns `AccountError::InvalidCredentials` for an unknown email or a wrong
/// password; the two cases are indistinguishable to the caller.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<User, AccountError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AccountError::Validation(
            "All fields are required.".to_string(),
        ));
    }

    let stored: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            [email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id, password_hash)) = stored else {
        return Err(AccountError::InvalidCredentials);
    };
    if !verify_password(password, &password_hash)? {
        tracing::debug!(user_id = id, "password mismatch");
        return Err(AccountError::InvalidCredentials);
    }

    get_user_refreshed(conn, id)
}

/// Retrieves a user by ID, returning the cached reputation as stored.
///
/// # Errors
///
/// Returns `AccountError::NotFound` if no user has this ID.
pub fn get_user(conn: &Connection, id: i64) -> Result<User, AccountError> {
    conn.query_row(
        "SELECT id, username, email, reputation, date_joined FROM users WHERE id = ?1",
        [id],
        map_row_to_user,
    )
    .optional()?
    .ok_or(AccountError::NotFound(id))
}

/// Recomputes a user's reputation, then returns the user.
///
/// # Errors
///
/// Returns `AccountError::NotFound` if no user has this ID.
pub fn get_user_refreshed(conn: &Connection, id: i64) -> Result<User, AccountError> {
    match devflow_reputation::recompute_reputation(conn, id) {
        Ok(_) => {}
        Err(devflow_reputation::ReputationError::UserNotFound(_)) => {
            return Err(AccountError::NotFound(id))
        }
        Err(e) => return Err(e.into()),
    }
    get_user(conn, id)
}

/// Looks up a user by email.
pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AccountError> {
    let user = conn
        .query_row(
            "SELECT id, username, email, reputation, date_joined FROM users WHERE email = ?1",
            [email],
            map_row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Lists all users, oldest account first.
pub fn list_users(conn: &Connection) -> Result<Vec<User>, AccountError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, reputation, date_joined FROM users ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], map_row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        reputation: row.get(3)?,
        date_joined: row.get(4)?,
    })
}
