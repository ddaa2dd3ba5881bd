//! Pipeline assembly
//!
//! Turns a [`LoggerBlueprint`] into a running [`DataLogger`]: sources first (connecting with retry),
//! then sinks, then one session driven by the blueprint's timing.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{DataSink, DataSource, LoggerBlueprint, RenameRules, TickOutcome};
use data_logger::{resolve, CancellationToken, DataLogger, SinkNames, SourceNames};
use observability::{record_session_finished, record_tick_metrics, TickMetricsAggregator};
use sources::DeviceRegistry;
use tracing::{info, warn};

use super::stats::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
pub struct PipelineConfig {
    /// Loaded (and already overridden) blueprint
    pub blueprint: LoggerBlueprint,

    /// Metrics server port
    pub metrics_port: Option<u16>,
}

/// One logging session built from configuration
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Build the logger and run until the session completes or `cancel` fires
    pub async fn run(self, cancel: CancellationToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let aggregator = Arc::new(Mutex::new(TickMetricsAggregator::new()));
        let logger = build_logger(blueprint, Arc::clone(&aggregator)).await?;

        for (sink, header) in logger.headers() {
            info!(sink = %sink, columns = ?header, "Resolved sink header");
        }

        info!(
            interval_sec = blueprint.session.interval_sec,
            duration_sec = ?blueprint.session.duration_sec,
            "Logging session started"
        );

        let report = logger
            .run_session(&blueprint.session, cancel)
            .await
            .context("Logging session failed")?;

        record_session_finished(report.status.as_str(), report.ticks);

        let tick_metrics = match aggregator.lock() {
            Ok(agg) => agg.summary(),
            Err(poisoned) => poisoned.into_inner().summary(),
        };

        let stats = PipelineStats {
            status: report.status,
            ticks: report.ticks,
            late_ticks: report.late_ticks,
            duration: start_time.elapsed(),
            active_sources: blueprint.sources.len(),
            active_sinks: blueprint.sinks.len(),
            tick_metrics,
            source_metrics: logger.source_metrics(),
            sink_metrics: logger.sink_metrics(),
        };

        info!(
            status = report.status.as_str(),
            ticks = report.ticks,
            late_ticks = report.late_ticks,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Logging session finished"
        );

        Ok(stats)
    }
}

/// Create every source and sink of `blueprint` and build the logger
///
/// Every tick outcome is recorded as metrics and folded into `aggregator`.
pub async fn build_logger(
    blueprint: &LoggerBlueprint,
    aggregator: Arc<Mutex<TickMetricsAggregator>>,
) -> Result<DataLogger> {
    let mut devices = DeviceRegistry::new();
    let sources = build_sources(blueprint, &mut devices).await?;
    let sinks = build_sinks(blueprint, &mut devices)?;

    if sinks.is_empty() {
        warn!("No sinks configured - every row will be dropped");
    }

    let mut builder = DataLogger::builder()
        .rename_rules(RenameRules::from(blueprint.rename.as_slice()))
        .prefix_delimiter(blueprint.session.prefix_delimiter.clone())
        .on_tick(move |outcome: &TickOutcome| {
            record_tick_metrics(outcome);
            match aggregator.lock() {
                Ok(mut agg) => agg.update(outcome),
                Err(poisoned) => poisoned.into_inner().update(outcome),
            }
        });

    for (name, source) in sources {
        builder = builder.source(name, source);
    }
    for (name, sink) in sinks {
        builder = builder.sink(name, sink);
    }

    builder.build().context("Failed to build data logger")
}

/// Resolved header of every sink, computed without opening any sink
///
/// Sources are still created, since their variable names are only known once constructed.
pub async fn preview_headers(blueprint: &LoggerBlueprint) -> Result<Vec<(String, Vec<String>)>> {
    let mut devices = DeviceRegistry::new();
    let sources = build_sources(blueprint, &mut devices).await?;

    let timestamp_keys = blueprint
        .sinks
        .iter()
        .map(|config| {
            sinks::timestamp_column(config)
                .map_err(|e| CliError::adapter("sink", &config.name, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let source_names: Vec<SourceNames<'_>> = sources
        .iter()
        .map(|(name, source)| SourceNames {
            name,
            variables: source.variable_names(),
        })
        .collect();
    let sink_names: Vec<SinkNames<'_>> = blueprint
        .sinks
        .iter()
        .zip(&timestamp_keys)
        .map(|(config, key)| SinkNames {
            name: &config.name,
            timestamp_key: key.as_deref(),
        })
        .collect();

    let rules = RenameRules::from(blueprint.rename.as_slice());
    let resolved = resolve(
        &source_names,
        &sink_names,
        &rules,
        &blueprint.session.prefix_delimiter,
    )
    .context("Failed to resolve column names")?;

    Ok(resolved
        .layouts()
        .iter()
        .map(|layout| (layout.sink().to_string(), layout.header()))
        .collect())
}

async fn build_sources(
    blueprint: &LoggerBlueprint,
    devices: &mut DeviceRegistry,
) -> Result<Vec<(String, Arc<dyn DataSource>)>> {
    let mut sources = Vec::with_capacity(blueprint.sources.len());
    for config in &blueprint.sources {
        let source = sources::create_source(config, devices)
            .await
            .map_err(|e| CliError::adapter("source", &config.name, e))?;
        sources.push((config.name.clone(), source));
    }
    info!(count = sources.len(), "Sources ready");
    Ok(sources)
}

fn build_sinks(
    blueprint: &LoggerBlueprint,
    devices: &mut DeviceRegistry,
) -> Result<Vec<(String, Arc<dyn DataSink>)>> {
    let mut sinks = Vec::with_capacity(blueprint.sinks.len());
    for config in &blueprint.sinks {
        let sink = sinks::create_sink(config, devices)
            .map_err(|e| CliError::adapter("sink", &config.name, e))?;
        sinks.push((config.name.clone(), sink));
    }
    info!(count = sinks.len(), "Sinks ready");
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    fn blueprint(toml: &str) -> LoggerBlueprint {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    #[tokio::test]
    async fn preview_resolves_collisions_without_opening_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_created.csv");
        let bp = blueprint(&format!(
            r#"
[session]
interval_sec = 1.0

[[sources]]
name = "Sou1"
source_type = "random"
params = {{ size = "2" }}

[[sources]]
name = "Sou2"
source_type = "random"
params = {{ size = "2" }}

[[sinks]]
name = "OutA"
sink_type = "csv"
params = {{ path = "{}" }}

[[sinks]]
name = "Pub"
sink_type = "loopback"
params = {{ device = "plc" }}

[[rename]]
source = "Sou1"
sink = "OutA"
mapping = {{ RandData0 = "A0", RandData1 = "A1" }}
"#,
            path.display()
        ));

        let headers = preview_headers(&bp).await.unwrap();
        assert_eq!(
            headers[0],
            (
                "OutA".to_string(),
                vec!["Time", "A0", "A1", "RandData0", "RandData1"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            )
        );
        assert_eq!(
            headers[1].1,
            vec!["Sou1_RandData0", "Sou1_RandData1", "Sou2_RandData0", "Sou2_RandData1"]
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn pipeline_runs_until_cancelled() {
        let bp = blueprint(
            r#"
[session]
interval_sec = 0.01

[[sources]]
name = "dev"
source_type = "loopback"
params = { device = "bank", registers = "r1,r2" }

[[sinks]]
name = "log"
sink_type = "log"
"#,
        );

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            stopper.cancel();
        });

        let stats = Pipeline::new(PipelineConfig {
            blueprint: bp,
            metrics_port: None,
        })
        .run(cancel)
        .await
        .unwrap();

        assert_eq!(stats.status, data_logger::SessionStatus::Cancelled);
        assert!(stats.ticks >= 1);
        assert_eq!(stats.tick_metrics.total_ticks, stats.ticks);
        assert_eq!(stats.sink_metrics[0].1.write_count, stats.ticks);
    }
}
