use devflow_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn db_initialization_works() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("init.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");

    let conn = pool.get().expect("failed to get connection");
    let applied = run_migrations(&conn).expect("failed to run migrations");
    assert_eq!(applied, 4);
    drop(conn);

    // A second pooled connection sees the same schema.
    let other = pool.get().expect("failed to get second connection");
    let mut stmt = other
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect();

    assert_eq!(
        tables,
        vec![
            "_devflow_migrations",
            "answer_votes",
            "answers",
            "notifications",
            "question_votes",
            "questions",
            "users",
        ]
    );
}

#[test]
fn foreign_keys_cascade_votes_with_question() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("cascade.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    run_migrations(&conn).expect("failed to run migrations");

    conn.execute_batch(
        "INSERT INTO users (username, email, password_hash) VALUES ('ann', 'ann@x.io', 'h');
         INSERT INTO questions (user_id, title, body) VALUES (1, 'Title', 'A body long enough to pass');
         INSERT INTO question_votes (question_id, user_id, direction) VALUES (1, 1, 'up');
         DELETE FROM questions WHERE id = 1;",
    )
    .expect("cascade script should succeed");

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM question_votes", [], |row| row.get(0))
        .expect("failed to count votes");
    assert_eq!(remaining, 0);
}
