//! Benchmark runner: drives one backend through the whole workload.

use std::time::Instant;

use tracing::{info, info_span};

use crate::backends::{Backend, BackendFactory};
use crate::error::{Error, Operation, Result};
use crate::report::BenchmarkResult;
use crate::workload::{Workload, WorkloadItem};

/// Run the full workload against a fresh backend from `factory`.
///
/// The measured region covers opening the handle, schema setup and every
/// create/read/update/delete cycle; it ends right after the final delete.
/// The handle is closed afterwards. The first failure aborts the run and no
/// result is produced.
pub fn run_backend(factory: &dyn BackendFactory, workload: &Workload) -> Result<BenchmarkResult> {
    let name = factory.name().to_string();
    let span = info_span!("benchmark", backend = %name, items = workload.len());
    let _guard = span.enter();

    info!("starting run");
    let start = Instant::now();

    let mut backend = factory.open().map_err(|source| Error::Setup {
        backend: name.clone(),
        operation: Operation::Open,
        source,
    })?;
    backend.setup().map_err(|source| Error::Setup {
        backend: name.clone(),
        operation: Operation::Setup,
        source,
    })?;

    for item in workload.iter() {
        run_cycle(backend.as_mut(), &name, &item)?;
    }

    let elapsed = start.elapsed();

    backend.close().map_err(|source| Error::Setup {
        backend: name.clone(),
        operation: Operation::Close,
        source,
    })?;

    info!(elapsed = ?elapsed, "run complete");
    Ok(BenchmarkResult::new(name, elapsed))
}

/// One create → read → update → delete cycle on the id the create returned.
fn run_cycle(backend: &mut dyn Backend, name: &str, item: &WorkloadItem) -> Result<()> {
    let index = item.index();

    let id = backend
        .create(item)
        .map_err(|e| Error::at(name, Operation::Create, index, e))?;

    let record = backend
        .read(id)
        .map_err(|e| Error::at(name, Operation::Read, index, e))?;
    let expected_label = backend.expected_label(item);
    if record.id != id || record.label != expected_label || record.value != item.value() {
        return Err(Error::Mismatch {
            backend: name.to_string(),
            index,
            expected: (expected_label, item.value()),
            actual: (record.label, record.value),
        });
    }

    backend
        .update(id, item)
        .map_err(|e| Error::at(name, Operation::Update, index, e))?;

    backend
        .delete(id)
        .map_err(|e| Error::at(name, Operation::Delete, index, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::backends::{BackendResult, RecordId, StoredRecord, Strategy};
    use crate::config::StorageMode;
    use crate::error::BackendError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Setup,
        Create(usize, RecordId),
        Read(RecordId),
        Update(RecordId, i64),
        Delete(RecordId),
        Close,
    }

    /// Failures injected into a [`Recording`] backend.
    #[derive(Debug, Clone, Copy, Default)]
    struct Faults {
        /// Fail the read of this workload index.
        fail_read_at: Option<usize>,
        /// Return a wrong value from the read of this workload index.
        corrupt_read_at: Option<usize>,
        /// Fail on close.
        fail_close: bool,
    }

    /// In-memory backend that records every call.
    struct Recording {
        calls: Rc<RefCell<Vec<Call>>>,
        rows: HashMap<RecordId, (String, i64)>,
        next_id: i64,
        last_index: usize,
        faults: Faults,
    }

    impl Backend for Recording {
        fn name(&self) -> &str {
            "Recording"
        }

        fn setup(&mut self) -> BackendResult<()> {
            self.calls.borrow_mut().push(Call::Setup);
            Ok(())
        }

        fn create(&mut self, item: &WorkloadItem) -> BackendResult<RecordId> {
            self.next_id += 1;
            let id = RecordId::try_from(self.next_id)?;
            self.last_index = item.index();
            self.rows.insert(id, (item.code(), item.value()));
            self.calls.borrow_mut().push(Call::Create(item.index(), id));
            Ok(id)
        }

        fn read(&mut self, id: RecordId) -> BackendResult<StoredRecord> {
            self.calls.borrow_mut().push(Call::Read(id));
            if self.faults.fail_read_at == Some(self.last_index) {
                return Err(BackendError::NotFound(id));
            }
            let (label, mut value) = self
                .rows
                .get(&id)
                .cloned()
                .ok_or(BackendError::NotFound(id))?;
            if self.faults.corrupt_read_at == Some(self.last_index) {
                value += 1;
            }
            Ok(StoredRecord { id, label, value })
        }

        fn update(&mut self, id: RecordId, item: &WorkloadItem) -> BackendResult<()> {
            let row = self.rows.get_mut(&id).ok_or(BackendError::NotFound(id))?;
            row.1 = item.updated_value();
            self.calls
                .borrow_mut()
                .push(Call::Update(id, item.updated_value()));
            Ok(())
        }

        fn delete(&mut self, id: RecordId) -> BackendResult<()> {
            self.rows.remove(&id).ok_or(BackendError::NotFound(id))?;
            self.calls.borrow_mut().push(Call::Delete(id));
            Ok(())
        }

        fn expected_label(&self, item: &WorkloadItem) -> String {
            item.code()
        }

        fn close(self: Box<Self>) -> BackendResult<()> {
            self.calls.borrow_mut().push(Call::Close);
            if self.faults.fail_close {
                return Err(BackendError::RowsAffected {
                    expected: 1,
                    actual: 0,
                });
            }
            Ok(())
        }
    }

    struct RecordingFactory {
        calls: Rc<RefCell<Vec<Call>>>,
        faults: Faults,
    }

    impl RecordingFactory {
        fn new(faults: Faults) -> Self {
            Self {
                calls: Rc::new(RefCell::new(Vec::new())),
                faults,
            }
        }
    }

    impl BackendFactory for RecordingFactory {
        fn name(&self) -> &str {
            "Recording"
        }

        fn open(&self) -> BackendResult<Box<dyn Backend>> {
            Ok(Box::new(Recording {
                calls: Rc::clone(&self.calls),
                rows: HashMap::new(),
                next_id: 0,
                last_index: 0,
                faults: self.faults,
            }))
        }
    }

    #[test]
    fn test_cycles_run_in_order_on_own_ids() {
        let factory = RecordingFactory::new(Faults::default());

        let result = run_backend(&factory, &Workload::default()).unwrap();
        assert_eq!(result.backend(), "Recording");

        let calls = factory.calls.borrow();
        assert_eq!(calls.first(), Some(&Call::Setup));
        assert_eq!(calls.last(), Some(&Call::Close));

        let cycles: Vec<_> = calls[1..calls.len() - 1].chunks(4).collect();
        assert_eq!(cycles.len(), 1000);
        for (i, cycle) in cycles.iter().enumerate() {
            let Call::Create(index, id) = cycle[0] else {
                panic!("cycle {i} does not start with create: {:?}", cycle);
            };
            assert_eq!(index, i);
            assert_eq!(cycle[1], Call::Read(id));
            assert_eq!(cycle[2], Call::Update(id, i as i64 * 20));
            assert_eq!(cycle[3], Call::Delete(id));
        }
    }

    #[test]
    fn test_failure_aborts_without_result() {
        let factory = RecordingFactory::new(Faults {
            fail_read_at: Some(500),
            ..Default::default()
        });

        let err = run_backend(&factory, &Workload::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Operation {
                operation: Operation::Read,
                index: 500,
                ..
            }
        ));

        // Nothing after the failed read, not even close.
        let calls = factory.calls.borrow();
        assert!(matches!(calls.last(), Some(Call::Read(_))));
        assert!(!calls.contains(&Call::Close));
    }

    #[test]
    fn test_wrong_read_back_is_a_mismatch() {
        let factory = RecordingFactory::new(Faults {
            corrupt_read_at: Some(42),
            ..Default::default()
        });

        let err = run_backend(&factory, &Workload::default()).unwrap_err();
        match &err {
            Error::Mismatch {
                backend,
                index,
                expected,
                actual,
            } => {
                assert_eq!(backend, "Recording");
                assert_eq!(*index, 42);
                assert_eq!(expected, &("P42".to_string(), 420));
                assert_eq!(actual, &("P42".to_string(), 421));
            }
            other => panic!("unexpected error: {other}"),
        }

        // The cycle stops at the read; no update, delete or close follows.
        let calls = factory.calls.borrow();
        assert!(matches!(calls.last(), Some(Call::Read(_))));
        assert!(!calls.contains(&Call::Close));
        let updates = calls
            .iter()
            .filter(|call| matches!(call, Call::Update(..)))
            .count();
        assert_eq!(updates, 42);
    }

    #[test]
    fn test_close_failure_has_no_item_index() {
        let factory = RecordingFactory::new(Faults {
            fail_close: true,
            ..Default::default()
        });

        let err = run_backend(&factory, &Workload::new(10)).unwrap_err();
        assert!(matches!(
            err,
            Error::Setup {
                operation: Operation::Close,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "Recording close failed: expected 1 row(s) affected, got 0"
        );
        assert_eq!(factory.calls.borrow().last(), Some(&Call::Close));
    }

    #[test]
    fn test_real_backend_elapsed_is_measured() {
        let factory = Strategy::RawSql.with_storage(StorageMode::Memory);
        let result = run_backend(&factory, &Workload::new(25)).unwrap();
        assert_eq!(result.backend(), "SQLC");
        assert!(result.elapsed() > std::time::Duration::ZERO);
    }
}
