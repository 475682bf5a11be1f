#![allow(dead_code)]

use mass_update::{Error, migration::Context, rusqlite::Connection};
use tempfile::NamedTempFile;

pub const PAST: i64 = 1_000_000_000_000;
pub const NOW: i64 = 1_500_000_000_000;

/// Table touched by the identity migration, as it looked before version 5.6.
pub const USERS_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login VARCHAR(255),
        name VARCHAR(200),
        external_identity VARCHAR(255),
        external_identity_provider VARCHAR(100),
        created_at BIGINT,
        updated_at BIGINT
    );
";

pub fn init() {
    // Set environment to something like:
    // RUST_LOG=mass_update=debug cargo test
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Where the SQLite database under test keeps its data. Files behave differently from in-memory
/// databases with regard to locking, so both are tested.
#[derive(Debug, Clone, Copy)]
pub enum Storage {
    InMemory,
    File,
}

pub struct Database {
    pub connection: Connection,
    // Deleted once the database is dropped. Declared last, so the connection is closed first.
    _file: Option<NamedTempFile>,
}

impl Storage {
    /// An empty database with the `users` table.
    pub fn open(self) -> anyhow::Result<Database> {
        init();
        let (connection, file) = match self {
            Storage::InMemory => (Connection::open_in_memory()?, None),
            Storage::File => {
                let file = NamedTempFile::new()?;
                (Connection::open(file.path())?, Some(file))
            }
        };
        connection.execute_batch(USERS_SCHEMA)?;
        Ok(Database {
            connection,
            _file: file,
        })
    }
}

pub fn insert_user(
    connection: &Connection,
    login: &str,
    external_identity: Option<&str>,
    external_identity_provider: Option<&str>,
    updated_at: i64,
) -> Result<(), Error> {
    let context = Context::new(connection);
    let mut insert = context.prepare_upsert(
        "INSERT INTO users (login, external_identity, external_identity_provider, created_at, \
        updated_at) VALUES (?, ?, ?, ?, ?)",
    )?;
    let mut binding = insert.new_binding();
    binding
        .set_text(1, login)?
        .set(2, external_identity)?
        .set(3, external_identity_provider)?
        .set_i64(4, PAST)?
        .set_i64(5, updated_at)?;
    insert.queue(binding)?;
    insert.flush_remaining()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub external_identity: Option<String>,
    pub external_identity_provider: Option<String>,
    pub updated_at: i64,
}

pub fn select_user(connection: &Connection, login: &str) -> Result<Option<User>, Error> {
    Context::new(connection).get(
        &format!(
            "SELECT external_identity, external_identity_provider, updated_at FROM users \
            WHERE login='{login}'"
        ),
        |row| {
            Ok(User {
                external_identity: row.get_nullable_text(1)?.map(str::to_owned),
                external_identity_provider: row.get_nullable_text(2)?.map(str::to_owned),
                updated_at: row.get_i64(3)?,
            })
        },
    )
}
