//! ormbench command-line driver.
//!
//! Runs every strategy once over the workload and prints the ranking.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ormbench::{
    run_all, BackendFactory, BenchConfig, OutputFormat, Report, StorageMode, StrategyFactory,
    DEFAULT_WORKLOAD_SIZE,
};

/// Compare CRUD throughput of SQL access strategies.
#[derive(Parser, Debug)]
#[command(name = "ormbench")]
#[command(version, about = "Compare CRUD throughput of SQL access strategies")]
pub struct Args {
    /// Number of create/read/update/delete cycles per strategy
    #[arg(short = 'n', long, default_value_t = DEFAULT_WORKLOAD_SIZE)]
    pub size: usize,

    /// Storage used for each strategy's database
    #[arg(long, default_value = "memory", value_enum)]
    pub storage: StorageMode,

    /// Output format of the results section
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Convert command-line arguments to harness configuration.
    pub fn into_config(self) -> BenchConfig {
        BenchConfig::new()
            .with_workload_size(self.size)
            .with_storage(self.storage)
    }
}

fn main() {
    // Logs go to stderr so they never interleave with the report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ormbench=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let format = args.format;

    if let Err(e) = run(args.into_config(), format) {
        tracing::error!(error = %e, "benchmark failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: BenchConfig, format: OutputFormat) -> ormbench::Result<()> {
    config.validate()?;
    tracing::info!(
        items = config.workload_size,
        storage = %config.storage,
        "configuration loaded"
    );

    let factories = StrategyFactory::all(config.storage);
    let factories: Vec<&dyn BackendFactory> =
        factories.iter().map(|f| f as &dyn BackendFactory).collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let results = run_all(&factories, &config.workload(), &mut out)?;

    let report = Report::new(results);
    write!(out, "{}", report.render(format))?;
    out.flush()?;
    Ok(())
}
