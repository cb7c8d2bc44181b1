//! Generated-model backend in the style of SQLBoiler.
//!
//! The `users` model below is what a schema-first generator would emit: a
//! plain struct with column constants, a finder, and methods that write the
//! whole row back by primary key.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::BackendError;
use crate::workload::WorkloadItem;

use super::{close_connection, expect_one_row, Backend, BackendResult, RecordId, StoredRecord};

const USER_SCHEMA: &str = r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        score INTEGER NOT NULL
    );
"#;

/// Column names of `users`.
pub mod user_columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const SCORE: &str = "score";
}

/// A `users` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub score: i64,
}

impl User {
    /// Insert this user, taking the id assigned by the store.
    pub fn insert(&mut self, conn: &Connection) -> BackendResult<()> {
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO users ({}, {}) VALUES (?1, ?2)",
            user_columns::NAME,
            user_columns::SCORE
        ))?;
        self.id = stmt.insert(params![self.name, self.score])?;
        Ok(())
    }

    /// Write every non-key column back. Returns the number of rows affected.
    pub fn update(&self, conn: &Connection) -> BackendResult<usize> {
        let mut stmt = conn.prepare_cached(&format!(
            "UPDATE users SET {} = ?1, {} = ?2 WHERE {} = ?3",
            user_columns::NAME,
            user_columns::SCORE,
            user_columns::ID
        ))?;
        Ok(stmt.execute(params![self.name, self.score, self.id])?)
    }

    /// Delete this user. Returns the number of rows affected.
    pub fn delete(&self, conn: &Connection) -> BackendResult<usize> {
        let mut stmt = conn.prepare_cached(&format!(
            "DELETE FROM users WHERE {} = ?1",
            user_columns::ID
        ))?;
        Ok(stmt.execute([self.id])?)
    }
}

/// Find a user by primary key.
pub fn find_user(conn: &Connection, id: i64) -> BackendResult<Option<User>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {}, {}, {} FROM users WHERE {} = ?1",
        user_columns::ID,
        user_columns::NAME,
        user_columns::SCORE,
        user_columns::ID
    ))?;
    let user = stmt
        .query_row([id], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                score: row.get(2)?,
            })
        })
        .optional()?;
    Ok(user)
}

/// SQLBoiler-style backend.
pub struct SqlBoilerBackend {
    conn: Connection,
}

impl SqlBoilerBackend {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn find(&self, id: RecordId) -> BackendResult<User> {
        find_user(&self.conn, id.get())?.ok_or(BackendError::NotFound(id))
    }
}

impl Backend for SqlBoilerBackend {
    fn name(&self) -> &str {
        "SQLBoiler"
    }

    fn setup(&mut self) -> BackendResult<()> {
        self.conn.execute_batch(USER_SCHEMA)?;
        Ok(())
    }

    fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId> {
        let mut user = User {
            name: item.user_name(),
            score: item.value(),
            ..Default::default()
        };
        user.insert(&self.conn)?;
        RecordId::try_from(user.id)
    }

    fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord> {
        let user = self.find(id)?;
        Ok(StoredRecord {
            id,
            label: user.name,
            value: user.score,
        })
    }

    fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()> {
        let mut user = self.find(id)?;
        user.score = item.updated_value();
        expect_one_row(user.update(&self.conn)?)
    }

    fn delete(&mut self, id: RecordId) -> BackendResult<()> {
        let user = User {
            id: id.get(),
            ..Default::default()
        };
        expect_one_row(user.delete(&self.conn)?)
    }

    fn expected_label(&self, item: &WorkloadItem) -> String {
        item.user_name()
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        close_connection(self.conn)
    }
}
