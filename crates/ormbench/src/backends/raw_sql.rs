//! Raw driver backend.
//!
//! Issues hand-written SQL through cached prepared statements, the way
//! query code generated by sqlc ends up talking to the driver.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::BackendError;
use crate::workload::WorkloadItem;

use super::{close_connection, expect_one_row, Backend, BackendResult, RecordId, StoredRecord};

const CREATE_TABLE: &str = r#"
    CREATE TABLE products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        price INTEGER NOT NULL
    );
"#;

const INSERT_PRODUCT: &str = "INSERT INTO products (code, price) VALUES (?1, ?2)";
const SELECT_PRODUCT: &str = "SELECT code, price FROM products WHERE id = ?1";
const UPDATE_PRICE: &str = "UPDATE products SET price = ?1 WHERE id = ?2";
const DELETE_PRODUCT: &str = "DELETE FROM products WHERE id = ?1";

/// Raw SQL backend.
pub struct RawSqlBackend {
    conn: Connection,
}

impl RawSqlBackend {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Backend for RawSqlBackend {
    fn name(&self) -> &str {
        "SQLC"
    }

    fn setup(&mut self) -> BackendResult<()> {
        self.conn.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId> {
        let mut stmt = self.conn.prepare_cached(INSERT_PRODUCT)?;
        let id = stmt.insert(params![item.code(), item.value()])?;
        RecordId::try_from(id)
    }

    fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord> {
        let mut stmt = self.conn.prepare_cached(SELECT_PRODUCT)?;
        let row = stmt
            .query_row([id.get()], |row| {
                Ok(StoredRecord {
                    id,
                    label: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .optional()?;
        row.ok_or(BackendError::NotFound(id))
    }

    fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()> {
        let mut stmt = self.conn.prepare_cached(UPDATE_PRICE)?;
        expect_one_row(stmt.execute(params![item.updated_value(), id.get()])?)
    }

    fn delete(&mut self, id: RecordId) -> BackendResult<()> {
        let mut stmt = self.conn.prepare_cached(DELETE_PRODUCT)?;
        expect_one_row(stmt.execute([id.get()])?)
    }

    fn expected_label(&self, item: &WorkloadItem) -> String {
        item.code()
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        close_connection(self.conn)
    }
}
