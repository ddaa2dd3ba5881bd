//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{LoggerBlueprint, SinkType, SourceType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    interval_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_sec: Option<f64>,
    source_count: usize,
    sink_count: usize,
    rename_rule_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    interval_sec: blueprint.session.interval_sec,
                    duration_sec: blueprint.session.duration_sec,
                    source_count: blueprint.sources.len(),
                    sink_count: blueprint.sinks.len(),
                    rename_rule_count: blueprint.rename.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &LoggerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sources.is_empty() {
        warnings.push("No sources configured - rows will only carry timestamps".to_string());
    }
    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - every row will be dropped".to_string());
    }
    if blueprint.session.duration_sec.is_none() {
        warnings.push("No session duration - logging runs until interrupted".to_string());
    }

    if let Some(duration) = blueprint.session.duration_sec {
        if duration < blueprint.session.interval_sec {
            warnings.push(format!(
                "duration_sec ({duration}) is shorter than interval_sec ({}) - only one tick will run",
                blueprint.session.interval_sec
            ));
        }
    }

    // A loopback sink without a loopback source on the same device (or vice versa) is allowed
    // but usually a typo in the device name.
    for sink in &blueprint.sinks {
        if sink.sink_type != SinkType::Loopback {
            continue;
        }
        let device = sink.params.get("device");
        let has_reader = blueprint.sources.iter().any(|s| {
            s.source_type == SourceType::Loopback && s.params.get("device") == device
        });
        if !has_reader {
            warnings.push(format!(
                "Loopback sink '{}' writes a device no source reads",
                sink.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Interval: {}s", summary.interval_sec);
            match summary.duration_sec {
                Some(duration) => println!("  Duration: {duration}s"),
                None => println!("  Duration: unbounded"),
            }
            println!("  Sources: {}", summary.source_count);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Rename rules: {}", summary.rename_rule_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn valid_config_reports_summary_and_warnings() {
        let file = write_config(
            r#"
[session]
interval_sec = 2.0
duration_sec = 1.0

[[sources]]
name = "Sou1"
source_type = "random"

[[sinks]]
name = "plc"
sink_type = "loopback"
params = { device = "bank" }
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.source_count, 1);
        assert_eq!(summary.sink_count, 1);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("plc"));
    }

    #[test]
    fn missing_file_is_invalid() {
        let result = validate_config(&ValidateArgs {
            config: "does/not/exist.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }
}
