mod common;

use common::{NOW, PAST, Storage, User, insert_user, select_user};
use mass_update::{
    Clock,
    migration::{
        MigrationStep,
        v56::{DEFAULT_IDENTITY_PROVIDER, UpdateUsersExternalIdentityWhenEmpty},
    },
    rusqlite::Connection,
};
use test_case::test_case;

fn now() -> i64 {
    NOW
}

fn assert_user_is_updated(connection: &Connection, login: &str) {
    let user = select_user(connection, login).unwrap().unwrap();
    assert_eq!(
        User {
            external_identity: Some(login.to_owned()),
            external_identity_provider: Some(DEFAULT_IDENTITY_PROVIDER.to_owned()),
            updated_at: NOW,
        },
        user
    );
}

#[test_case(Storage::InMemory; "in memory")]
#[test_case(Storage::File; "file")]
fn migrate_users(storage: Storage) {
    // Given
    let db = storage.open().unwrap();
    let conn = &db.connection;
    insert_user(conn, "user-without-external-identity", None, None, PAST).unwrap();
    insert_user(conn, "user-with-only-external-identity-provider", None, Some("github"), PAST)
        .unwrap();
    insert_user(conn, "user-with-only-external-identity", Some("login1"), None, PAST).unwrap();
    insert_user(conn, "user-with-both-external-identity", Some("login2"), Some("github"), PAST)
        .unwrap();

    // When
    UpdateUsersExternalIdentityWhenEmpty::new(conn, now)
        .execute()
        .unwrap();

    // Then
    assert_user_is_updated(conn, "user-without-external-identity");
    assert_user_is_updated(conn, "user-with-only-external-identity-provider");
    assert_user_is_updated(conn, "user-with-only-external-identity");
    // Left alone, including the timestamp
    let untouched = select_user(conn, "user-with-both-external-identity")
        .unwrap()
        .unwrap();
    assert_eq!(
        User {
            external_identity: Some("login2".to_owned()),
            external_identity_provider: Some("github".to_owned()),
            updated_at: PAST,
        },
        untouched
    );
}

#[test_case(Storage::InMemory; "in memory")]
#[test_case(Storage::File; "file")]
fn does_not_fail_when_no_user(storage: Storage) {
    let db = storage.open().unwrap();

    UpdateUsersExternalIdentityWhenEmpty::new(&db.connection, now)
        .execute()
        .unwrap();
}

/// A user without login must not keep the other users from being migrated.
#[test]
fn user_without_login_does_not_abort_migration() {
    // Given
    let db = Storage::InMemory.open().unwrap();
    let conn = &db.connection;
    conn.execute(
        "INSERT INTO users (login, created_at, updated_at) VALUES (NULL, ?1, ?1)",
        [PAST],
    )
    .unwrap();
    insert_user(conn, "bob", None, None, PAST).unwrap();

    // When
    UpdateUsersExternalIdentityWhenEmpty::new(conn, now)
        .execute()
        .unwrap();

    // Then
    assert_user_is_updated(conn, "bob");
    let (identity, provider): (Option<String>, Option<String>) = conn
        .query_row(
            "SELECT external_identity, external_identity_provider FROM users WHERE login IS NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(None, identity);
    assert_eq!(Some(DEFAULT_IDENTITY_PROVIDER.to_owned()), provider);
}

/// Running the step a second time must not touch rows migrated by the first run.
#[test]
fn second_execution_changes_nothing() {
    // Given a migrated database
    let db = Storage::InMemory.open().unwrap();
    let conn = &db.connection;
    insert_user(conn, "alice", None, None, PAST).unwrap();
    UpdateUsersExternalIdentityWhenEmpty::new(conn, now)
        .execute()
        .unwrap();

    // When running again with a later clock
    let later = || NOW + 1_000;
    UpdateUsersExternalIdentityWhenEmpty::new(conn, later)
        .execute()
        .unwrap();

    // Then the timestamp of the first run is kept
    assert_user_is_updated(conn, "alice");
}

/// Migrate more users than fit into a single batch.
#[test]
fn migrate_many_users() {
    let db = Storage::InMemory.open().unwrap();
    let conn = &db.connection;
    let num_users = 1_000;
    for index in 0..num_users {
        // Every fourth user already has an identity
        let identity = format!("identity-{index}");
        let (identity, provider) = if index % 4 == 0 {
            (Some(identity.as_str()), Some("github"))
        } else {
            (None, None)
        };
        insert_user(conn, &format!("user-{index}"), identity, provider, PAST).unwrap();
    }

    UpdateUsersExternalIdentityWhenEmpty::new(conn, now)
        .execute()
        .unwrap();

    let stale: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users \
            WHERE external_identity IS NULL OR external_identity_provider IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(0, stale);
    let stamped: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users WHERE updated_at = ?",
            [NOW],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(750, stamped);
}

/// The step reads the clock once, so all rows of a run carry the same timestamp.
#[test]
fn clock_is_read_once_per_execution() {
    use std::cell::Cell;

    struct Ticking(Cell<i64>);

    impl Clock for Ticking {
        fn now(&self) -> i64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    let db = Storage::InMemory.open().unwrap();
    let conn = &db.connection;
    insert_user(conn, "alice", None, None, PAST).unwrap();
    insert_user(conn, "bob", None, None, PAST).unwrap();

    UpdateUsersExternalIdentityWhenEmpty::new(conn, Ticking(Cell::new(NOW)))
        .execute()
        .unwrap();

    assert_eq!(NOW, select_user(conn, "alice").unwrap().unwrap().updated_at);
    assert_eq!(NOW, select_user(conn, "bob").unwrap().unwrap().updated_at);
}
