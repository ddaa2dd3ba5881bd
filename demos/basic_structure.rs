//! Basic Structure Demo
//!
//! Reads a few values from the random simulators, then logs one random source to two CSV files
//! (`;` and tab delimited) once per second for five seconds.
//!
//! Run with: cargo run -p demos --bin basic_structure

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use contracts::DataSource;
use data_logger::{CancellationToken, DataLogger};
use observability::{LogFormat, ObservabilityConfig};
use sinks::{CsvSink, CsvSinkConfig};
use sources::{RandomDataSource, RandomSourceConfig, RandomStringSource};

fn random_config(size: usize, missing_rate: f64) -> RandomSourceConfig {
    RandomSourceConfig {
        size,
        key_missing_rate: missing_rate,
        value_missing_rate: missing_rate,
        ..RandomSourceConfig::default()
    }
}

/// Print `requests` readings in declaration order (`-` for a missing value)
fn print_readings(label: &str, source: &dyn DataSource, requests: usize) -> Result<()> {
    for req in 0..requests {
        let reading = source.read()?;
        let rendered: Vec<String> = source
            .variable_names()
            .iter()
            .map(|name| match reading.get(name) {
                Some(Some(value)) => format!("{name}={value}"),
                Some(None) => format!("{name}=None"),
                None => format!("{name}=-"),
            })
            .collect();
        println!("{label}, request {req}: {}", rendered.join(" "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..ObservabilityConfig::default()
    })?;

    tracing::info!("Starting basic structure demo");

    // Sources are passive: values are produced only when read
    print_readings("Random source", &RandomDataSource::new(random_config(5, 0.0)), 5)?;
    print_readings(
        "Random source (missing rates 0.5)",
        &RandomDataSource::new(random_config(5, 0.5)),
        5,
    )?;
    print_readings(
        "Random string source",
        &RandomStringSource::new(RandomSourceConfig {
            str_length: 10,
            ..random_config(5, 0.0)
        }),
        5,
    )?;

    // One source, two CSV outputs that differ only in their delimiter
    let out_1 = CsvSink::new("Out1", CsvSinkConfig::new("Results/basic_structure_1.csv"))?;
    let out_2 = CsvSink::new(
        "Out2",
        CsvSinkConfig {
            delimiter: b'\t',
            ..CsvSinkConfig::new("Results/basic_structure_2.csv")
        },
    )?;

    let logger = DataLogger::builder()
        .source("Sou", Arc::new(RandomDataSource::new(random_config(10, 0.2))))
        .sink("Out1", Arc::new(out_1))
        .sink("Out2", Arc::new(out_2))
        .build()?;

    let report = logger
        .run(
            Duration::from_secs(1),
            Some(Duration::from_secs(5)),
            CancellationToken::new(),
        )
        .await?;

    tracing::info!(
        ticks = report.ticks,
        status = report.status.as_str(),
        "Logging finished, see Results/basic_structure_*.csv"
    );

    Ok(())
}
