use devflow_accounts::{
    authenticate, find_user_by_email, get_user, get_user_refreshed, list_users, register_user,
    AccountError, Registration,
};
use rusqlite::Connection;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    devflow_db::run_migrations(&conn).unwrap();
    conn
}

fn registration(username: &str, email: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: "correct-horse".to_string(),
    }
}

#[test]
fn register_then_login() {
    let conn = setup_db();
    let user = register_user(&conn, &registration("alice", "alice@example.com")).unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.reputation, 0);

    let stored: String = conn
        .query_row(
            "SELECT password_hash FROM users WHERE id = ?1",
            [user.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_ne!(stored, "correct-horse");

    let logged_in = authenticate(&conn, "alice@example.com", "correct-horse").unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[test]
fn login_failures_are_indistinguishable() {
    let conn = setup_db();
    register_user(&conn, &registration("alice", "alice@example.com")).unwrap();

    let wrong_password = authenticate(&conn, "alice@example.com", "nope-nope").unwrap_err();
    let unknown_email = authenticate(&conn, "bob@example.com", "correct-horse").unwrap_err();

    assert!(matches!(wrong_password, AccountError::InvalidCredentials));
    assert!(matches!(unknown_email, AccountError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[test]
fn duplicate_email_and_username_are_rejected() {
    let conn = setup_db();
    register_user(&conn, &registration("alice", "alice@example.com")).unwrap();

    let same_email = register_user(&conn, &registration("alice2", "alice@example.com"));
    assert!(matches!(same_email, Err(AccountError::EmailTaken)));

    let same_name = register_user(&conn, &registration("alice", "other@example.com"));
    assert!(matches!(same_name, Err(AccountError::UsernameTaken)));

    assert_eq!(list_users(&conn).unwrap().len(), 1);
}

#[test]
fn invalid_registration_writes_nothing() {
    let conn = setup_db();
    let bad = Registration {
        username: "al".to_string(),
        email: "alice@example.com".to_string(),
        password: "correct-horse".to_string(),
    };
    assert!(matches!(
        register_user(&conn, &bad),
        Err(AccountError::Validation(_))
    ));
    assert!(find_user_by_email(&conn, "alice@example.com")
        .unwrap()
        .is_none());
}

#[test]
fn refreshed_read_recomputes_stale_reputation() {
    let conn = setup_db();
    let user = register_user(&conn, &registration("alice", "alice@example.com")).unwrap();
    conn.execute(
        "INSERT INTO questions (user_id, title, body) VALUES (?1, 'Some title', 'A body that is long enough')",
        [user.id],
    )
    .unwrap();

    assert_eq!(get_user(&conn, user.id).unwrap().reputation, 0);
    assert_eq!(get_user_refreshed(&conn, user.id).unwrap().reputation, 5);
    assert_eq!(get_user(&conn, user.id).unwrap().reputation, 5);
}

#[test]
fn unknown_user_is_not_found() {
    let conn = setup_db();
    assert!(matches!(get_user(&conn, 99), Err(AccountError::NotFound(99))));
    assert!(matches!(
        get_user_refreshed(&conn, 99),
        Err(AccountError::NotFound(99))
    ));
}

#[test]
fn user_serializes_without_password() {
    let conn = setup_db();
    let user = register_user(&conn, &registration("alice", "alice@example.com")).unwrap();
    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password").is_none());
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("dateJoined").is_some());
}
