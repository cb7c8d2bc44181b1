//! ormbench: comparative CRUD benchmark harness.
//!
//! Runs the same create/read/update/delete workload against several
//! data-access strategies over SQLite and reports which one finishes first.
//!
//! # Strategies
//!
//! - **SQLC**: hand-written SQL through cached prepared statements
//! - **GORM**: active-record models with auto-migration and soft delete
//! - **Ent**: fluent per-entity builder client
//! - **SQLBoiler**: schema-first generated models
//!
//! Each strategy gets its own fresh store per run, the workload is a pure
//! function of the item index, and results are ranked with a stable
//! first-encountered tie-break.

pub mod backends;
pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod runner;
pub mod workload;

pub use backends::{Backend, BackendFactory, RecordId, StoredRecord, Strategy, StrategyFactory};
pub use config::{BenchConfig, StorageMode};
pub use error::{BackendError, Error, Operation, Result};
pub use harness::run_all;
pub use report::{rank, BenchmarkResult, OutputFormat, Report};
pub use runner::run_backend;
pub use workload::{Workload, WorkloadItem, DEFAULT_WORKLOAD_SIZE};
