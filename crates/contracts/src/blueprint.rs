//! LoggerBlueprint - Config Loader output
//!
//! Describes a complete logging setup: session timing, named sources, named sinks and rename rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

use crate::ContractError;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete logger configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Session timing
    #[validate(nested)]
    pub session: SessionConfig,

    /// Data sources, in declaration order
    #[serde(default)]
    #[validate(nested)]
    pub sources: Vec<SourceConfig>,

    /// Data sinks, in declaration order
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,

    /// Rename rules per (source, sink) pair
    #[serde(default)]
    #[validate(nested)]
    pub rename: Vec<RenameRuleConfig>,
}

/// Session timing and naming options
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Tick interval (seconds), must be > 0
    #[validate(range(exclusive_min = 0.0))]
    pub interval_sec: f64,

    /// Session duration (seconds); absent = unbounded
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub duration_sec: Option<f64>,

    /// Delimiter between source name and variable name in the prefixing fallback
    #[serde(default = "default_prefix_delimiter")]
    #[validate(length(min = 1))]
    pub prefix_delimiter: String,
}

fn default_prefix_delimiter() -> String {
    "_".to_string()
}

impl SessionConfig {
    /// Tick interval as a `Duration`
    pub fn interval(&self) -> Result<Duration, ContractError> {
        positive_duration("session.interval_sec", self.interval_sec)
    }

    /// Session duration as a `Duration` (`None` = unbounded)
    pub fn duration(&self) -> Result<Option<Duration>, ContractError> {
        self.duration_sec
            .map(|secs| positive_duration("session.duration_sec", secs))
            .transpose()
    }
}

fn positive_duration(field: &str, secs: f64) -> Result<Duration, ContractError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(ContractError::config_validation(
            field,
            format!("must be a finite value > 0, got {secs}"),
        )),
    }
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Source name (unique within a logger)
    #[validate(length(min = 1))]
    pub name: String,

    /// Source type
    pub source_type: SourceType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Random floats
    Random,
    /// Random strings
    RandomString,
    /// JSON datagrams pushed over UDP
    Udp,
    /// Register bank of a loopback device
    Loopback,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name (unique within a logger)
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Delimited text file
    Csv,
    /// Tracing output
    Log,
    /// JSON datagrams over UDP
    Udp,
    /// Register bank of a loopback device
    Loopback,
}

/// Rename rule for one (source, sink) pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRuleConfig {
    /// Source name
    #[validate(length(min = 1))]
    pub source: String,

    /// Sink name
    #[validate(length(min = 1))]
    pub sink: String,

    /// Old variable name -> new variable name
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

impl LoggerBlueprint {
    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Look up a sink by name
    pub fn sink(&self, name: &str) -> Option<&SinkConfig> {
        self.sinks.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(interval_sec: f64, duration_sec: Option<f64>) -> SessionConfig {
        SessionConfig {
            interval_sec,
            duration_sec,
            prefix_delimiter: default_prefix_delimiter(),
        }
    }

    #[test]
    fn session_durations() {
        let s = session(2.0, Some(10.0));
        assert_eq!(s.interval().unwrap(), Duration::from_secs(2));
        assert_eq!(s.duration().unwrap(), Some(Duration::from_secs(10)));

        let unbounded = session(0.5, None);
        assert_eq!(unbounded.duration().unwrap(), None);
    }

    #[test]
    fn session_rejects_non_positive_values() {
        assert!(session(0.0, None).interval().is_err());
        assert!(session(-1.0, None).interval().is_err());
        assert!(session(f64::NAN, None).interval().is_err());
        assert!(session(1.0, Some(0.0)).duration().is_err());
    }

    #[test]
    fn field_rules_are_checked() {
        let mut s = session(1.0, None);
        assert!(s.validate().is_ok());
        s.prefix_delimiter.clear();
        assert!(s.validate().is_err());
        assert!(session(0.0, None).validate().is_err());
    }

    #[test]
    fn sink_type_names() {
        let t: SinkType = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(t, SinkType::Csv);
        let t: SourceType = serde_json::from_str("\"random_string\"").unwrap();
        assert_eq!(t, SourceType::RandomString);
    }
}
