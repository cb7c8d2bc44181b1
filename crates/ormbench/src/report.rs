//! Benchmark results, ranking and report rendering.

use std::fmt::Write as _;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde::{Deserialize, Serialize};

/// Output format for the results section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text lines
    #[default]
    Text,
    /// JSON document
    Json,
    /// ASCII table
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Elapsed time of one backend's full workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    backend: String,
    #[serde(rename = "elapsed_ns", with = "duration_nanos")]
    elapsed: Duration,
}

impl BenchmarkResult {
    pub fn new(backend: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            backend: backend.into(),
            elapsed,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_nanos().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_nanos(u64::deserialize(d)?))
    }
}

/// Pick the fastest result.
///
/// Linear scan with a strict comparison: among equal durations the first one
/// in the slice wins. Returns `None` only for an empty slice.
pub fn rank(results: &[BenchmarkResult]) -> Option<&BenchmarkResult> {
    let mut fastest: Option<&BenchmarkResult> = None;
    for result in results {
        match fastest {
            Some(best) if result.elapsed >= best.elapsed => {}
            _ => fastest = Some(result),
        }
    }
    fastest
}

/// A JSON object carrying only an error message.
fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [BenchmarkResult],
    fastest: Option<&'a BenchmarkResult>,
}

/// The complete set of results from one harness run.
#[derive(Debug, Clone)]
pub struct Report {
    results: Vec<BenchmarkResult>,
}

impl Report {
    /// Build a report from every backend's result, in invocation order.
    pub fn new(results: Vec<BenchmarkResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// The fastest result, first-encountered on ties.
    pub fn fastest(&self) -> Option<&BenchmarkResult> {
        rank(&self.results)
    }

    /// Render the results section in the given format.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.render_text(),
            OutputFormat::Json => self.render_json(),
            OutputFormat::Table => self.render_table(),
        }
    }

    fn render_text(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "\n🏆 BENCHMARK RESULTS");
        let _ = writeln!(output, "====================");
        for result in &self.results {
            let _ = writeln!(output, "{}:  {:?}", result.backend, result.elapsed);
        }
        if let Some(fastest) = self.fastest() {
            let _ = writeln!(
                output,
                "\n🥇 Fastest: {} ({:?})",
                fastest.backend, fastest.elapsed
            );
        }
        output
    }

    fn render_json(&self) -> String {
        let report = JsonReport {
            results: &self.results,
            fastest: self.fastest(),
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| error_json(&e.to_string()))
    }

    fn render_table(&self) -> String {
        let fastest = self.fastest().map(|r| r.backend.as_str());
        let mut table = Table::new();
        table.set_header(vec!["Backend", "Elapsed", ""]);
        for result in &self.results {
            let marker = if Some(result.backend.as_str()) == fastest {
                "fastest"
            } else {
                ""
            };
            table.add_row(vec![
                Cell::new(&result.backend),
                Cell::new(format!("{:?}", result.elapsed)),
                Cell::new(marker),
            ]);
        }
        format!("{table}\n")
    }
}
