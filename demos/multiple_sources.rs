//! Multiple Sources Demo
//!
//! Two random sources declaring the same variable names, logged to two CSV files:
//! 1. no rename rules: both outputs fall back to `<source>_<variable>` columns
//! 2. rename rules for OutA: OutA keeps the renamed columns, OutB stays prefixed
//! 3. a partial rename for OutB that leaves a duplicate: OutB is prefixed again
//!
//! Run with: cargo run -p demos --bin multiple_sources

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use contracts::{DataSource, RenameRules};
use data_logger::{CancellationToken, DataLogger};
use observability::{LogFormat, ObservabilityConfig};
use sinks::{CsvSink, CsvSinkConfig};
use sources::{RandomDataSource, RandomSourceConfig};

fn source() -> Arc<dyn DataSource> {
    Arc::new(RandomDataSource::new(RandomSourceConfig {
        size: 2,
        key_missing_rate: 0.0,
        value_missing_rate: 0.0,
        ..RandomSourceConfig::default()
    }))
}

async fn run_session(label: &str, rules: RenameRules) -> Result<()> {
    let out_a = CsvSink::new("OutA", CsvSinkConfig::new("Results/multiple_sources_A.csv"))?;
    let out_b = CsvSink::new("OutB", CsvSinkConfig::new("Results/multiple_sources_B.csv"))?;

    let logger = DataLogger::builder()
        .source("Sou1", source())
        .source("Sou2", source())
        .sink("OutA", Arc::new(out_a))
        .sink("OutB", Arc::new(out_b))
        .rename_rules(rules)
        .build()?;

    println!("\n{label}");
    for (sink, header) in logger.headers() {
        println!("  {sink}: {}", header.join(", "));
    }

    let report = logger
        .run(
            Duration::from_secs(1),
            Some(Duration::from_secs(5)),
            CancellationToken::new(),
        )
        .await?;
    tracing::info!(ticks = report.ticks, "Session finished");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..ObservabilityConfig::default()
    })?;

    run_session("Without rename rules", RenameRules::new()).await?;

    let out_a_rules = RenameRules::new()
        .with_rule(
            "Sou1",
            "OutA",
            [("RandData0", "RandData0_S1"), ("RandData1", "RandData1_S1")],
        )
        .with_rule(
            "Sou2",
            "OutA",
            [("RandData0", "RandData0_S2"), ("RandData1", "RandData1_S2")],
        );
    run_session("Rename rules for OutA", out_a_rules.clone()).await?;

    // RandData1 still collides on OutB, so every OutB column is prefixed again
    let partial = out_a_rules.with_rule("Sou1", "OutB", [("RandData0", "RandData0_S1")]);
    run_session("Partial rename for OutB", partial).await?;

    Ok(())
}
