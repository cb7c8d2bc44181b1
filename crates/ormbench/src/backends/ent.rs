//! Fluent builder backend in the style of Ent.
//!
//! A [`Client`] hands out per-entity clients whose builders collect field
//! values and only touch the store on `save` / `exec`.

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::error::BackendError;
use crate::workload::WorkloadItem;

use super::{close_connection, expect_one_row, Backend, BackendResult, RecordId, StoredRecord};

const USER_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        age INTEGER NOT NULL,
        name TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// A `users` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub age: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Entry point for all entity clients.
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Run the schema migration.
    pub fn schema_create(&self) -> BackendResult<()> {
        self.conn.execute_batch(USER_SCHEMA)?;
        Ok(())
    }

    /// Client for the `User` entity.
    pub fn user(&self) -> UserClient<'_> {
        UserClient { conn: &self.conn }
    }

    /// Release the underlying connection.
    pub fn close(self) -> BackendResult<()> {
        close_connection(self.conn)
    }
}

/// Operations on `User`.
pub struct UserClient<'a> {
    conn: &'a Connection,
}

impl<'a> UserClient<'a> {
    /// Start building a new user.
    pub fn create(&self) -> UserCreate<'a> {
        UserCreate {
            conn: self.conn,
            age: None,
            name: None,
        }
    }

    /// Fetch a user by id.
    pub fn get(&self, id: i64) -> BackendResult<Option<User>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, age, name, created_at, updated_at FROM users WHERE id = ?1",
        )?;
        let user = stmt
            .query_row([id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    age: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .optional()?;
        Ok(user)
    }

    /// Start building an update of one user.
    pub fn update_one_id(&self, id: i64) -> UserUpdateOne<'a> {
        UserUpdateOne {
            conn: self.conn,
            id,
            age: None,
            name: None,
        }
    }

    /// Prepare deletion of one user.
    pub fn delete_one_id(&self, id: i64) -> UserDeleteOne<'a> {
        UserDeleteOne {
            conn: self.conn,
            id,
        }
    }
}

/// Builder for inserting a user.
pub struct UserCreate<'a> {
    conn: &'a Connection,
    age: Option<i64>,
    name: Option<String>,
}

impl UserCreate<'_> {
    pub fn set_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Insert the user and return it as stored.
    pub fn save(self) -> BackendResult<User> {
        let (Some(age), Some(name)) = (self.age, self.name) else {
            return Err(BackendError::Validation(
                "User.age and User.name are required".to_string(),
            ));
        };
        let stamp = Utc::now().to_rfc3339();
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO users (age, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let id = stmt.insert(rusqlite::params![age, name, stamp, stamp])?;
        Ok(User {
            id,
            age,
            name,
            created_at: stamp.clone(),
            updated_at: stamp,
        })
    }
}

/// Builder for updating one user.
pub struct UserUpdateOne<'a> {
    conn: &'a Connection,
    id: i64,
    age: Option<i64>,
    name: Option<String>,
}

impl UserUpdateOne<'_> {
    pub fn set_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Apply the update, stamping `updated_at`. Fails if the user is gone.
    pub fn save(self) -> BackendResult<()> {
        let mut sets = Vec::new();
        let mut values = Vec::new();
        if let Some(age) = self.age {
            sets.push("age");
            values.push(SqlValue::Integer(age));
        }
        if let Some(name) = self.name {
            sets.push("name");
            values.push(SqlValue::Text(name));
        }
        sets.push("updated_at");
        values.push(SqlValue::Text(Utc::now().to_rfc3339()));

        let assignments: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len() + 1
        );
        values.push(SqlValue::Integer(self.id));

        let mut stmt = self.conn.prepare_cached(&sql)?;
        expect_one_row(stmt.execute(params_from_iter(values))?)
    }
}

/// Deletion of one user.
pub struct UserDeleteOne<'a> {
    conn: &'a Connection,
    id: i64,
}

impl UserDeleteOne<'_> {
    /// Delete the user. Fails if it does not exist.
    pub fn exec(self) -> BackendResult<()> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM users WHERE id = ?1")?;
        expect_one_row(stmt.execute([self.id])?)
    }
}

/// Ent-style backend. The numeric field lives in `age`.
pub struct EntBackend {
    client: Client,
}

impl EntBackend {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            client: Client::new(conn),
        }
    }
}

impl Backend for EntBackend {
    fn name(&self) -> &str {
        "Ent"
    }

    fn setup(&mut self) -> BackendResult<()> {
        self.client.schema_create()
    }

    fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId> {
        let user = self
            .client
            .user()
            .create()
            .set_age(item.value())
            .set_name(item.user_name())
            .save()?;
        RecordId::try_from(user.id)
    }

    fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord> {
        let user = self
            .client
            .user()
            .get(id.get())?
            .ok_or(BackendError::NotFound(id))?;
        Ok(StoredRecord {
            id,
            label: user.name,
            value: user.age,
        })
    }

    fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()> {
        self.client
            .user()
            .update_one_id(id.get())
            .set_age(item.updated_value())
            .save()
    }

    fn delete(&mut self, id: RecordId) -> BackendResult<()> {
        self.client.user().delete_one_id(id.get()).exec()
    }

    fn expected_label(&self, item: &WorkloadItem) -> String {
        item.user_name()
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        self.client.close()
    }
}
