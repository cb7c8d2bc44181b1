//! Active-record backend in the style of GORM.
//!
//! Models describe their table through the [`Model`] trait and a generic
//! [`Db`] session builds the SQL for them at call time. Every model embeds the
//! standard `id`, `created_at`, `updated_at` and `deleted_at` columns, and
//! deletes are soft: the row stays in the table with `deleted_at` set and
//! becomes invisible to [`Db::first`].

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, ToSql};

use crate::error::BackendError;
use crate::workload::WorkloadItem;

use super::{close_connection, expect_one_row, Backend, BackendResult, RecordId, StoredRecord};

/// Columns shared by every model, in select order.
const BASE_COLUMNS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// The embedded base fields of a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelBase {
    pub id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl ModelBase {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            updated_at: row.get(2)?,
            deleted_at: row.get(3)?,
        })
    }
}

/// A struct mapped onto a table.
pub trait Model: Sized {
    /// Table name.
    const TABLE: &'static str;

    /// Model columns and their SQL types, excluding the base columns.
    const FIELDS: &'static [(&'static str, &'static str)];

    /// Shared base fields.
    fn base(&self) -> &ModelBase;

    /// Shared base fields, mutably.
    fn base_mut(&mut self) -> &mut ModelBase;

    /// Values of [`Model::FIELDS`], in declaration order.
    fn values(&self) -> Vec<SqlValue>;

    /// Build a model from its base fields and a row whose model columns start
    /// at `offset`.
    fn from_row(base: ModelBase, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;
}

/// A product, mirroring `gorm.Model` + `Code` + `Price`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    pub model: ModelBase,
    pub code: String,
    pub price: i64,
}

impl Model for Product {
    const TABLE: &'static str = "products";
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("code", "TEXT"), ("price", "INTEGER")];

    fn base(&self) -> &ModelBase {
        &self.model
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.model
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.code.clone()),
            SqlValue::Integer(self.price),
        ]
    }

    fn from_row(model: ModelBase, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            model,
            code: row.get(offset)?,
            price: row.get(offset + 1)?,
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn select_columns<M: Model>() -> String {
    BASE_COLUMNS
        .iter()
        .copied()
        .chain(M::FIELDS.iter().map(|(name, _)| *name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A database session.
pub struct Db {
    conn: Connection,
}

impl Db {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the model's table and its soft-delete index if missing.
    pub fn auto_migrate<M: Model>(&self) -> BackendResult<()> {
        let fields: String = M::FIELDS
            .iter()
            .map(|(name, ty)| format!(",\n    {name} {ty}"))
            .collect();
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    \
             id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             created_at DATETIME,\n    \
             updated_at DATETIME,\n    \
             deleted_at DATETIME{fields}\n);\n\
             CREATE INDEX IF NOT EXISTS idx_{table}_deleted_at ON {table}(deleted_at);",
            table = M::TABLE,
        );
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    /// Insert a model, filling in its id and timestamps.
    pub fn create<M: Model>(&self, model: &mut M) -> BackendResult<()> {
        let stamp = now();
        let names: Vec<&str> = M::FIELDS.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len() + 2).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} (created_at, updated_at, {}) VALUES ({})",
            M::TABLE,
            names.join(", "),
            placeholders.join(", ")
        );

        let mut values = vec![SqlValue::Text(stamp.clone()), SqlValue::Text(stamp.clone())];
        values.extend(model.values());

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let id = stmt.insert(params_from_iter(values))?;

        let base = model.base_mut();
        base.id = id;
        base.created_at = stamp.clone();
        base.updated_at = stamp;
        base.deleted_at = None;
        Ok(())
    }

    /// Find the first live record with the given primary key.
    pub fn first<M: Model>(&self, id: i64) -> BackendResult<Option<M>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NULL ORDER BY id LIMIT 1",
            select_columns::<M>(),
            M::TABLE
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let model = stmt
            .query_row([id], |row| {
                let base = ModelBase::from_row(row)?;
                M::from_row(base, row, BASE_COLUMNS.len())
            })
            .optional()?;
        Ok(model)
    }

    /// Update a single column of a live record and bump `updated_at`.
    ///
    /// Returns the number of rows affected.
    pub fn update_column<M: Model>(
        &self,
        model: &mut M,
        column: &str,
        value: &dyn ToSql,
    ) -> BackendResult<usize> {
        if !M::FIELDS.iter().any(|(name, _)| *name == column) {
            return Err(BackendError::Validation(format!(
                "unknown column {}.{column}",
                M::TABLE
            )));
        }
        let stamp = now();
        let sql = format!(
            "UPDATE {} SET {column} = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
            M::TABLE
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let affected = stmt.execute(rusqlite::params![value, stamp, model.base().id])?;
        model.base_mut().updated_at = stamp;
        Ok(affected)
    }

    /// Soft-delete a live record. Returns the number of rows affected.
    pub fn delete<M: Model>(&self, model: &mut M) -> BackendResult<usize> {
        let stamp = now();
        let sql = format!(
            "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            M::TABLE
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let affected = stmt.execute(rusqlite::params![stamp, model.base().id])?;
        model.base_mut().deleted_at = Some(stamp);
        Ok(affected)
    }

    /// Consume the session, returning the connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

/// GORM-style backend.
///
/// Like application code using GORM, the model fetched by `read` is kept and
/// reused by the following `update` and `delete` instead of being reloaded.
pub struct GormBackend {
    db: Db,
    loaded: Option<Product>,
}

impl GormBackend {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Db::new(conn),
            loaded: None,
        }
    }

    fn load(&self, id: RecordId) -> BackendResult<Product> {
        self.db
            .first::<Product>(id.get())?
            .ok_or(BackendError::NotFound(id))
    }

    /// The model last read for `id`, or a fresh load.
    fn model(&mut self, id: RecordId) -> BackendResult<Product> {
        match self.loaded.take() {
            Some(product) if product.model.id == id.get() => Ok(product),
            _ => self.load(id),
        }
    }
}

impl Backend for GormBackend {
    fn name(&self) -> &str {
        "GORM"
    }

    fn setup(&mut self) -> BackendResult<()> {
        self.db.auto_migrate::<Product>()
    }

    fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId> {
        let mut product = Product {
            code: item.code(),
            price: item.value(),
            ..Default::default()
        };
        self.db.create(&mut product)?;
        RecordId::try_from(product.model.id)
    }

    fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord> {
        let product = self.load(id)?;
        let record = StoredRecord {
            id,
            label: product.code.clone(),
            value: product.price,
        };
        self.loaded = Some(product);
        Ok(record)
    }

    fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()> {
        let mut product = self.model(id)?;
        let price = item.updated_value();
        expect_one_row(self.db.update_column(&mut product, "price", &price)?)?;
        product.price = price;
        self.loaded = Some(product);
        Ok(())
    }

    fn delete(&mut self, id: RecordId) -> BackendResult<()> {
        let mut product = self.model(id)?;
        expect_one_row(self.db.delete(&mut product)?)
    }

    fn expected_label(&self, item: &WorkloadItem) -> String {
        item.code()
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        close_connection(self.db.into_inner())
    }
}
