//! Data-access strategies under benchmark.
//!
//! Every strategy reaches its own SQLite store through a different access
//! pattern but offers the same CRUD contract, so the runner can drive them
//! interchangeably.

pub mod ent;
pub mod gorm;
pub mod raw_sql;
pub mod sqlboiler;

use std::fmt;

use rusqlite::Connection;

use crate::config::StorageMode;
use crate::error::BackendError;
use crate::workload::WorkloadItem;

pub use ent::EntBackend;
pub use gorm::GormBackend;
pub use raw_sql::RawSqlBackend;
pub use sqlboiler::SqlBoilerBackend;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Identifier assigned by the store to a created record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a raw rowid. SQLite only assigns positive rowids to our tables.
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Raw rowid value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for RecordId {
    type Error = BackendError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(BackendError::InvalidId(raw))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    /// Textual field (`P<i>` or `user<i>`).
    pub label: String,
    /// Numeric field.
    pub value: i64,
}

/// The CRUD contract every strategy implements against its own handle.
pub trait Backend {
    /// Display name of the strategy.
    fn name(&self) -> &str;

    /// Create the schema in the (empty) store.
    fn setup(&mut self) -> BackendResult<()>;

    /// Insert the record derived from `item` and return its identifier.
    fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId>;

    /// Fetch a record. A missing row is an error.
    fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord>;

    /// Set the record's numeric field to `item.updated_value()`.
    fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()>;

    /// Remove a record.
    fn delete(&mut self, id: RecordId) -> BackendResult<()>;

    /// Textual field `create` stores for `item`.
    fn expected_label(&self, item: &WorkloadItem) -> String;

    /// Release the handle.
    fn close(self: Box<Self>) -> BackendResult<()>;
}

/// Opens fresh, exclusively owned backend handles.
pub trait BackendFactory {
    /// Display name of the backends this factory opens.
    fn name(&self) -> &str;

    /// Open a new handle on an empty store.
    fn open(&self) -> BackendResult<Box<dyn Backend>>;
}

/// The fixed set of strategies compared by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Gorm,
    RawSql,
    Ent,
    SqlBoiler,
}

impl Strategy {
    /// Every strategy, in invocation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Gorm,
        Strategy::RawSql,
        Strategy::Ent,
        Strategy::SqlBoiler,
    ];

    /// Display name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Gorm => "GORM",
            Strategy::RawSql => "SQLC",
            Strategy::Ent => "Ent",
            Strategy::SqlBoiler => "SQLBoiler",
        }
    }

    /// Bind this strategy to a storage mode.
    pub fn with_storage(self, storage: StorageMode) -> StrategyFactory {
        StrategyFactory {
            strategy: self,
            storage,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strategy plus the storage its handles are opened on.
#[derive(Debug, Clone, Copy)]
pub struct StrategyFactory {
    strategy: Strategy,
    storage: StorageMode,
}

impl StrategyFactory {
    /// Factories for every strategy on the given storage, in invocation order.
    pub fn all(storage: StorageMode) -> Vec<StrategyFactory> {
        Strategy::ALL
            .iter()
            .map(|strategy| strategy.with_storage(storage))
            .collect()
    }

    /// The wrapped strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl BackendFactory for StrategyFactory {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn open(&self) -> BackendResult<Box<dyn Backend>> {
        let conn = open_connection(self.storage)?;
        let backend: Box<dyn Backend> = match self.strategy {
            Strategy::Gorm => Box::new(GormBackend::new(conn)),
            Strategy::RawSql => Box::new(RawSqlBackend::new(conn)),
            Strategy::Ent => Box::new(EntBackend::new(conn)),
            Strategy::SqlBoiler => Box::new(SqlBoilerBackend::new(conn)),
        };
        Ok(backend)
    }
}

/// Open a fresh SQLite connection for one benchmark run.
pub fn open_connection(storage: StorageMode) -> BackendResult<Connection> {
    Ok(Connection::open(storage.path())?)
}

/// Close a connection, surfacing the driver's close error.
pub(crate) fn close_connection(conn: Connection) -> BackendResult<()> {
    conn.close().map_err(|(_, e)| BackendError::Sqlite(e))
}

/// Require that a statement touched exactly one row.
pub(crate) fn expect_one_row(actual: usize) -> BackendResult<()> {
    if actual == 1 {
        Ok(())
    } else {
        Err(BackendError::RowsAffected {
            expected: 1,
            actual,
        })
    }
}
