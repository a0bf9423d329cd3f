pub mod analyze;
pub mod args;
pub mod error;
pub mod metric;
pub mod output;
pub mod report;
pub mod result;
pub mod run_main;
pub mod settings;
pub mod simulate;
pub mod speedup;
pub mod workload;

pub use error::StatsError;
pub use metric::MetricValue;
pub use report::StatReport;
pub use workload::{WorkloadConfig, WorkloadStats};

use tracing::metadata::LevelFilter;

/// log to stderr, the level is read from `RUST_LOG`, `info` by default
pub fn init_logger() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .unwrap_or_else(|e| {
            eprintln!("failed to init logger: {}", e);
        });
}
