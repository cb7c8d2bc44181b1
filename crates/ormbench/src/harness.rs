//! Top-level driver: runs every backend in order and streams progress.

use std::io::Write;

use crate::backends::BackendFactory;
use crate::error::Result;
use crate::report::BenchmarkResult;
use crate::runner::run_backend;
use crate::workload::Workload;

/// Banner printed before any backend runs.
pub const BANNER: &str = "🚀 ORM Benchmark Testing\n========================\n";

/// Run the workload against each factory's backend, one after another.
///
/// Writes the banner and a `Testing <name>... ✅ <elapsed>` line per backend to
/// `out`. The first failure is returned immediately: the failing backend
/// contributes no result and later backends are never opened.
pub fn run_all<W: Write>(
    factories: &[&dyn BackendFactory],
    workload: &Workload,
    out: &mut W,
) -> Result<Vec<BenchmarkResult>> {
    write!(out, "{BANNER}")?;
    writeln!(out, "\n📊 Running Performance Benchmarks...")?;

    let mut results = Vec::with_capacity(factories.len());
    for factory in factories {
        write!(out, "Testing {}... ", factory.name())?;
        out.flush()?;

        let result = run_backend(*factory, workload)?;

        writeln!(out, "✅ {:?}", result.elapsed())?;
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::backends::{Backend, BackendResult, RawSqlBackend};
    use crate::error::{BackendError, Error};

    struct Counting<'a> {
        name: &'static str,
        opened: &'a Cell<usize>,
        fail: bool,
    }

    impl BackendFactory for Counting<'_> {
        fn name(&self) -> &str {
            self.name
        }

        fn open(&self) -> BackendResult<Box<dyn Backend>> {
            self.opened.set(self.opened.get() + 1);
            if self.fail {
                return Err(BackendError::InvalidId(0));
            }
            let conn = rusqlite::Connection::open_in_memory()?;
            Ok(Box::new(RawSqlBackend::new(conn)))
        }
    }

    #[test]
    fn test_progress_lines_in_order() {
        let opened = Cell::new(0);
        let a = Counting {
            name: "A",
            opened: &opened,
            fail: false,
        };
        let b = Counting {
            name: "B",
            opened: &opened,
            fail: false,
        };

        let mut out = Vec::new();
        let results = run_all(&[&a, &b], &Workload::new(3), &mut out).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].backend(), "A");
        assert_eq!(results[1].backend(), "B");

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(BANNER));
        let progress: Vec<_> = text
            .lines()
            .filter(|l| l.starts_with("Testing "))
            .collect();
        assert_eq!(progress.len(), 2);
        assert!(progress[0].starts_with("Testing A... ✅ "));
        assert!(progress[1].starts_with("Testing B... ✅ "));
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failure_is_returned_not_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_writer(move || writer.clone())
            .finish();

        let opened = Cell::new(0);
        let failing = Counting {
            name: "A",
            opened: &opened,
            fail: true,
        };
        let result = tracing::subscriber::with_default(subscriber, || {
            run_all(&[&failing], &Workload::new(3), &mut std::io::sink())
        });

        assert!(result.is_err());
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stops_at_first_failure() {
        let opened = Cell::new(0);
        let a = Counting {
            name: "A",
            opened: &opened,
            fail: false,
        };
        let b = Counting {
            name: "B",
            opened: &opened,
            fail: true,
        };
        let c = Counting {
            name: "C",
            opened: &opened,
            fail: false,
        };

        let mut out = Vec::new();
        let err = run_all(&[&a, &b, &c], &Workload::new(3), &mut out).unwrap_err();
        assert!(matches!(err, Error::Setup { .. }));
        assert_eq!(err.backend(), Some("B"));
        assert_eq!(opened.get(), 2);

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Testing C"));
        assert_eq!(text.matches('✅').count(), 1);
    }
}
