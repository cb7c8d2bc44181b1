//! Harness configuration.

use clap::ValueEnum;

use crate::error::{Error, Result};
use crate::workload::{Workload, DEFAULT_WORKLOAD_SIZE};

/// Where each backend keeps its SQLite database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StorageMode {
    /// Private in-memory database.
    #[default]
    Memory,
    /// Anonymous on-disk database, removed when the connection closes.
    TempFile,
}

impl StorageMode {
    /// Path handed to `Connection::open` for this mode.
    pub fn path(&self) -> &'static str {
        match self {
            StorageMode::Memory => ":memory:",
            // An empty filename asks SQLite for a private temporary file.
            StorageMode::TempFile => "",
        }
    }
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Memory => write!(f, "memory"),
            StorageMode::TempFile => write!(f, "temp-file"),
        }
    }
}

/// Benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of CRUD cycles per backend.
    pub workload_size: usize,

    /// Storage used by every backend.
    pub storage: StorageMode,
}

impl BenchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            workload_size: DEFAULT_WORKLOAD_SIZE,
            storage: StorageMode::default(),
        }
    }

    /// Set the workload size.
    pub fn with_workload_size(mut self, size: usize) -> Self {
        self.workload_size = size;
        self
    }

    /// Set the storage mode.
    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Check the configuration for values the harness cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workload_size == 0 {
            return Err(Error::Config(
                "workload size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the workload described by this configuration.
    pub fn workload(&self) -> Workload {
        Workload::new(self.workload_size)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new()
    }
}
