//! CsvSink - delimited text file with a fixed header
//!
//! The file is truncated when the sink is created. The header line is written by
//! `establish_header`, and every row after that is appended and flushed.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use contracts::params::{param_or, required_param};
use contracts::{ContractError, DataSink, FixedHeader, Row, DEFAULT_TIMESTAMP_KEY};
use tracing::{debug, error, instrument};

/// Configuration for CsvSink
#[derive(Debug, Clone)]
pub struct CsvSinkConfig {
    /// Output file
    pub path: PathBuf,
    /// Field delimiter: `;`, `,` or tab
    pub delimiter: u8,
    /// Whether rows carry the tick timestamp
    pub timestamp: bool,
    /// Column name of the timestamp
    pub timestamp_key: String,
}

impl CsvSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b';',
            timestamp: true,
            timestamp_key: DEFAULT_TIMESTAMP_KEY.to_string(),
        }
    }

    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let path: String = required_param(params, "path")?;
        let delimiter = match params.get("delimiter").map(String::as_str) {
            None | Some(";") => b';',
            Some(",") => b',',
            Some("\t") | Some("tab") => b'\t',
            Some(other) => {
                return Err(ContractError::config_validation(
                    "params.delimiter",
                    format!("unsupported delimiter '{other}', expected ';', ',' or tab"),
                ))
            }
        };

        Ok(Self {
            path: PathBuf::from(path),
            delimiter,
            timestamp: param_or(params, "timestamp", true)?,
            timestamp_key: param_or(
                params,
                "timestamp_key",
                DEFAULT_TIMESTAMP_KEY.to_string(),
            )?,
        })
    }
}

/// Sink that appends one delimited line per row
pub struct CsvSink {
    name: String,
    config: CsvSinkConfig,
    header: FixedHeader,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvSink {
    /// Create the sink, truncating (or creating) the output file
    pub fn new(name: impl Into<String>, config: CsvSinkConfig) -> Result<Self, ContractError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&config.path)?;
        let writer = csv::WriterBuilder::new()
            .delimiter(config.delimiter)
            .from_writer(file);

        let name = name.into();
        debug!(sink = %name, path = %config.path.display(), "CsvSink created");
        Ok(Self {
            name,
            config,
            header: FixedHeader::new(),
            writer: Mutex::new(writer),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        Self::new(name, CsvSinkConfig::from_params(params)?)
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Established header, if any
    pub fn columns(&self) -> Option<&[String]> {
        self.header.columns()
    }

    fn writer(&self) -> MutexGuard<'_, csv::Writer<File>> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_record<I, T>(&self, record: I) -> Result<(), ContractError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = self.writer();
        writer
            .write_record(record)
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|e| {
                error!(sink = %self.name, error = %e, "Write failed");
                ContractError::sink_write(format!("{}: {e}", self.name))
            })
    }
}

impl DataSink for CsvSink {
    fn needs_timestamp(&self) -> bool {
        self.config.timestamp
    }

    fn timestamp_key(&self) -> &str {
        &self.config.timestamp_key
    }

    fn requires_header(&self) -> bool {
        true
    }

    #[instrument(name = "csv_sink_header", skip(self, columns), fields(sink = %self.name))]
    fn establish_header(&self, columns: Vec<String>) -> Result<(), ContractError> {
        let columns = self.header.establish(columns)?;
        self.write_record(columns)
    }

    fn write(&self, row: &Row) -> Result<(), ContractError> {
        self.header.check(row)?;
        let fields: Vec<String> = row
            .iter()
            .map(|(_, value)| value.map(ToString::to_string).unwrap_or_default())
            .collect();
        self.write_record(&fields)
    }

    fn flush(&self) -> Result<(), ContractError> {
        self.writer().flush().map_err(ContractError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Value;
    use tempfile::tempdir;

    fn row(entries: &[(&str, Option<Value>)]) -> Row {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let sink = CsvSink::new("out", CsvSinkConfig::new(&path)).unwrap();

        sink.establish_header(vec!["Time".into(), "a".into(), "b".into()])
            .unwrap();
        sink.write(&row(&[
            ("Time", Some(Value::from("2024-01-01 00:00:00"))),
            ("a", Some(Value::Float(1.5))),
            ("b", None),
        ]))
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, ["Time;a;b", "2024-01-01 00:00:00;1.5;"]);
    }

    #[test]
    fn test_shape_mismatch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let sink = CsvSink::new("out", CsvSinkConfig::new(&path)).unwrap();
        sink.establish_header(vec!["a".into(), "b".into(), "c".into()])
            .unwrap();

        let err = sink
            .write(&row(&[("a", Some(Value::Int(1))), ("b", None)]))
            .unwrap_err();
        assert!(err.is_shape_mismatch());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_existing_file_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale\nstale\n").unwrap();

        let sink = CsvSink::new("out", CsvSinkConfig::new(&path)).unwrap();
        sink.establish_header(vec!["x".into()]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), ["x"]);
    }

    #[test]
    fn test_header_is_write_once() {
        let dir = tempdir().unwrap();
        let sink = CsvSink::new("out", CsvSinkConfig::new(dir.path().join("o.csv"))).unwrap();
        sink.establish_header(vec!["x".into()]).unwrap();
        assert!(sink.establish_header(vec!["y".into()]).is_err());
        assert_eq!(sink.columns().unwrap(), ["x"]);
    }

    #[test]
    fn test_config_from_params() {
        let params = HashMap::from([
            ("path".to_string(), "out.csv".to_string()),
            ("delimiter".to_string(), "tab".to_string()),
            ("timestamp".to_string(), "false".to_string()),
        ]);
        let config = CsvSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.delimiter, b'\t');
        assert!(!config.timestamp);
        assert_eq!(config.timestamp_key, "Time");

        let bad = HashMap::from([
            ("path".to_string(), "out.csv".to_string()),
            ("delimiter".to_string(), "|".to_string()),
        ]);
        assert!(CsvSinkConfig::from_params(&bad).is_err());
    }
}
