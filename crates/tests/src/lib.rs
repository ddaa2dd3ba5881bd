//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! - session scenarios against real CSV files (completion, cancellation, shape mismatch)
//! - CSV round trip of missing values
//! - dual-role loopback devices shared by two loggers
//! - configuration file to running logger

#[cfg(test)]
mod support {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use contracts::{ContractError, DataSink, Row};
    use data_logger::CancellationToken;
    use sinks::CsvSink;

    /// Parse a `;`-delimited file into records (header included)
    pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    /// CSV sink whose header was fixed by someone else; the logger only writes rows
    pub struct PinnedCsv(pub CsvSink);

    impl DataSink for PinnedCsv {
        fn needs_timestamp(&self) -> bool {
            false
        }

        fn write(&self, row: &Row) -> Result<(), ContractError> {
            self.0.write(row)
        }
    }

    /// CSV sink that cancels the session once it has persisted `after` rows
    pub struct CancellingCsv {
        pub inner: CsvSink,
        pub after: usize,
        pub token: CancellationToken,
        pub written: AtomicUsize,
    }

    impl DataSink for CancellingCsv {
        fn needs_timestamp(&self) -> bool {
            self.inner.needs_timestamp()
        }

        fn timestamp_key(&self) -> &str {
            self.inner.timestamp_key()
        }

        fn requires_header(&self) -> bool {
            self.inner.requires_header()
        }

        fn establish_header(&self, columns: Vec<String>) -> Result<(), ContractError> {
            self.inner.establish_header(columns)
        }

        fn write(&self, row: &Row) -> Result<(), ContractError> {
            self.inner.write(row)?;
            if self.written.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                self.token.cancel();
            }
            Ok(())
        }

        fn flush(&self) -> Result<(), ContractError> {
            self.inner.flush()
        }
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{DataSink, SinkFailureKind, Value};
    use data_logger::{CancellationToken, DataLogger, SessionStatus};
    use sinks::{CsvSink, CsvSinkConfig};
    use sources::BufferedSource;
    use tempfile::tempdir;

    use crate::support::{read_csv, CancellingCsv, PinnedCsv};

    fn publishing_source(values: &[(&str, i64)]) -> Arc<BufferedSource> {
        let names = values.iter().map(|(n, _)| n.to_string()).collect();
        let (source, publisher) = BufferedSource::new(names);
        // Take-and-clear: only the first read sees these
        for (name, value) in values {
            publisher.publish(name, Value::Int(*value));
        }
        Arc::new(source)
    }

    #[tokio::test(start_paused = true)]
    async fn completed_session_writes_one_line_per_tick() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results").join("out_a.csv");
        let sink = Arc::new(CsvSink::new("OutA", CsvSinkConfig::new(&path)).unwrap());

        let logger = DataLogger::builder()
            .source("Sou1", publishing_source(&[("a", 1), ("b", 2)]))
            .sink("OutA", sink)
            .build()
            .unwrap();

        let report = logger
            .run(
                Duration::from_secs(2),
                Some(Duration::from_secs(10)),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.ticks, 5);

        let records = read_csv(&path);
        assert_eq!(records.len(), 6);
        assert_eq!(records[0], ["Time", "a", "b"]);
        // Buffered values are consumed by the first read
        assert_eq!(records[1][1..], ["1", "2"]);
        for record in &records[2..] {
            assert_eq!(record[1..], ["", ""]);
            assert_eq!(record[0].len(), "2026-01-01 00:00:00".len());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_session_keeps_completed_ticks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let token = CancellationToken::new();
        let sink = Arc::new(CancellingCsv {
            inner: CsvSink::new("OutA", CsvSinkConfig::new(&path)).unwrap(),
            after: 3,
            token: token.clone(),
            written: AtomicUsize::new(0),
        });

        let logger = DataLogger::builder()
            .source("Sou1", publishing_source(&[("x", 7)]))
            .sink("OutA", sink)
            .build()
            .unwrap();

        let report = logger
            .run(Duration::from_secs(1), None, token)
            .await
            .unwrap();

        assert_eq!(report.status, SessionStatus::Cancelled);
        assert_eq!(report.ticks, 3);
        assert_eq!(read_csv(&path).len(), 4);
    }

    #[test]
    fn shape_mismatch_skips_only_the_misconfigured_sink() {
        let dir = tempdir().unwrap();
        let narrow_path = dir.path().join("narrow.csv");
        let good_path = dir.path().join("good.csv");

        let narrow = CsvSink::new("narrow", CsvSinkConfig::new(&narrow_path)).unwrap();
        narrow
            .establish_header(vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        let good = CsvSink::new("good", CsvSinkConfig::new(&good_path)).unwrap();

        let logger = DataLogger::builder()
            .source("Sou1", publishing_source(&[("a", 1), ("b", 2)]))
            .sink("narrow", Arc::new(PinnedCsv(narrow)))
            .sink("good", Arc::new(good))
            .build()
            .unwrap();

        let outcome = logger.log_once();

        assert_eq!(
            outcome.failed_sinks,
            [("narrow".to_string(), SinkFailureKind::ShapeMismatch)]
        );
        assert_eq!(outcome.written_sinks, ["good"]);
        assert_eq!(read_csv(&narrow_path), [["a", "b", "c"]]);

        let good_records = read_csv(&good_path);
        assert_eq!(good_records.len(), 2);
        assert_eq!(good_records[1][1..], ["1", "2"]);
    }
}

#[cfg(test)]
mod csv_round_trip_tests {
    use std::sync::Arc;

    use contracts::Value;
    use data_logger::DataLogger;
    use sinks::{CsvSink, CsvSinkConfig};
    use sources::BufferedSource;
    use tempfile::tempdir;

    use crate::support::read_csv;

    #[test]
    fn missing_values_are_empty_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("round_trip.csv");
        let (source, publisher) =
            BufferedSource::new(vec!["temp".to_string(), "flag".to_string(), "label".to_string()]);

        let logger = DataLogger::builder()
            .source("dev", Arc::new(source))
            .sink("out", Arc::new(CsvSink::new("out", CsvSinkConfig::new(&path)).unwrap()))
            .build()
            .unwrap();

        publisher.publish("temp", Value::Float(21.5));
        publisher.publish("label", Value::from("idle"));
        logger.log_once();

        publisher.publish("flag", Value::Bool(true));
        logger.log_once();

        logger.log_once();

        let records = read_csv(&path);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], ["Time", "temp", "flag", "label"]);
        assert_eq!(records[1][1..], ["21.5", "", "idle"]);
        assert_eq!(records[2][1..], ["", "true", ""]);
        assert_eq!(records[3][1..], ["", "", ""]);
    }

    #[test]
    fn tab_delimited_file_without_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.tsv");
        let config = CsvSinkConfig {
            delimiter: b'\t',
            timestamp: false,
            ..CsvSinkConfig::new(&path)
        };
        let (source, publisher) = BufferedSource::new(vec!["v".to_string()]);

        let logger = DataLogger::builder()
            .source("s", Arc::new(source))
            .sink("tsv", Arc::new(CsvSink::new("tsv", config).unwrap()))
            .build()
            .unwrap();

        publisher.publish("v", Value::Int(-3));
        logger.log_once();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), ["v", "-3"]);
    }
}

#[cfg(test)]
mod loopback_tests {
    use std::sync::Arc;

    use data_logger::DataLogger;
    use sinks::{CsvSink, CsvSinkConfig};
    use sources::{DeviceRegistry, RandomDataSource, RandomSourceConfig};
    use tempfile::tempdir;

    use crate::support::read_csv;

    #[test]
    fn one_device_written_by_one_logger_and_read_by_another() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readback.csv");
        let mut devices = DeviceRegistry::new();
        let plc = devices.device("plc");

        let random = RandomDataSource::new(RandomSourceConfig {
            size: 2,
            key_missing_rate: 0.0,
            value_missing_rate: 0.0,
            seed: Some(42),
            ..RandomSourceConfig::default()
        });
        let writer = DataLogger::builder()
            .source("Sou1", Arc::new(random))
            .sink("plc", Arc::new(plc.sink()))
            .build()
            .unwrap();

        let reader = DataLogger::builder()
            .source(
                "plc",
                Arc::new(
                    devices
                        .device("plc")
                        .source(vec!["RandData0".to_string(), "RandData1".to_string()]),
                ),
            )
            .sink("out", Arc::new(CsvSink::new("out", CsvSinkConfig::new(&path)).unwrap()))
            .build()
            .unwrap();

        // Loopback sinks take no timestamp column
        assert_eq!(writer.headers()[0].1, ["RandData0", "RandData1"]);

        let outcome = writer.log_once();
        assert!(outcome.is_clean());
        reader.log_once();

        let expected: Vec<String> = ["RandData0", "RandData1"]
            .iter()
            .map(|r| plc.get(r).unwrap().to_string())
            .collect();
        let records = read_csv(&path);
        assert_eq!(records[0], ["Time", "RandData0", "RandData1"]);
        assert_eq!(records[1][1..], expected[..]);
        assert_eq!(devices.len(), 1);
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::{Arc, Mutex};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RenameRules;
    use data_logger::{CancellationToken, DataLogger, SessionStatus};
    use observability::TickMetricsAggregator;
    use sources::DeviceRegistry;
    use tempfile::tempdir;

    use crate::support::read_csv;

    #[tokio::test(start_paused = true)]
    async fn configured_logger_resolves_renames_and_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_a.csv");
        let toml = format!(
            r#"
[session]
interval_sec = 1.0
duration_sec = 3.0

[[sources]]
name = "Sou1"
source_type = "random"
params = {{ size = "2", key_missing_rate = "0", value_missing_rate = "0", seed = "1" }}

[[sources]]
name = "Sou2"
source_type = "random"
params = {{ size = "2", key_missing_rate = "0", value_missing_rate = "0", seed = "2" }}

[[sinks]]
name = "OutA"
sink_type = "csv"
params = {{ path = "{}" }}

[[sinks]]
name = "plc"
sink_type = "loopback"
params = {{ device = "bank" }}

[[rename]]
source = "Sou1"
sink = "OutA"
mapping = {{ RandData0 = "RandData0_S1", RandData1 = "RandData1_S1" }}
"#,
            path.display()
        );
        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let mut devices = DeviceRegistry::new();
        let aggregator = Arc::new(Mutex::new(TickMetricsAggregator::new()));
        let observed = Arc::clone(&aggregator);
        let mut builder = DataLogger::builder()
            .rename_rules(RenameRules::from(blueprint.rename.as_slice()))
            .prefix_delimiter(blueprint.session.prefix_delimiter.clone())
            .on_tick(move |outcome| observed.lock().unwrap().update(outcome));
        for config in &blueprint.sources {
            let source = sources::create_source(config, &mut devices).await.unwrap();
            builder = builder.source(config.name.clone(), source);
        }
        for config in &blueprint.sinks {
            let sink = sinks::create_sink(config, &mut devices).unwrap();
            builder = builder.sink(config.name.clone(), sink);
        }
        let logger = builder.build().unwrap();

        let report = logger
            .run_session(&blueprint.session, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.ticks, 3);

        let records = read_csv(&path);
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0],
            ["Time", "RandData0_S1", "RandData1_S1", "RandData0", "RandData1"]
        );

        // No rename rules for the loopback sink: both sources collide and get prefixed
        let bank = devices.get("bank").unwrap().snapshot();
        assert_eq!(
            bank.keys().collect::<Vec<_>>(),
            ["Sou1_RandData0", "Sou1_RandData1", "Sou2_RandData0", "Sou2_RandData1"]
        );

        let summary = aggregator.lock().unwrap().summary();
        assert_eq!(summary.total_ticks, 3);
        assert_eq!(summary.clean_ticks, 3);
    }
}
