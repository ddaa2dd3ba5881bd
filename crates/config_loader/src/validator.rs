//! Configuration validation
//!
//! Rules:
//! - field-level rules declared on the blueprint types (`validator` derive)
//! - interval > 0, duration absent or > 0, both finite
//! - source names unique, sink names unique
//! - every rename rule refers to a declared source and a declared sink
//! - adapter parameters required by each type are present

use std::collections::HashSet;

use contracts::{ContractError, LoggerBlueprint, SinkType, SourceType};
use validator::Validate;

/// Validate a LoggerBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_session(blueprint)?;
    validate_source_names(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_rename_targets(blueprint)?;
    validate_params(blueprint)?;
    Ok(())
}

/// Field-level rules from the derive
fn validate_fields(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// Session timing
fn validate_session(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    blueprint.session.interval()?;
    blueprint.session.duration()?;
    Ok(())
}

/// Source names are unique
fn validate_source_names(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for source in &blueprint.sources {
        if !seen.insert(&source.name) {
            return Err(ContractError::config_validation(
                format!("sources[name={}]", source.name),
                "duplicate source name",
            ));
        }
    }
    Ok(())
}

/// Sink names are unique
fn validate_sink_names(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// Rename rules point at existing (source, sink) pairs
fn validate_rename_targets(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    for (idx, rule) in blueprint.rename.iter().enumerate() {
        if blueprint.source(&rule.source).is_none() {
            return Err(ContractError::config_validation(
                format!("rename[{idx}].source"),
                format!("source '{}' not found", rule.source),
            ));
        }
        if blueprint.sink(&rule.sink).is_none() {
            return Err(ContractError::config_validation(
                format!("rename[{idx}].sink"),
                format!("sink '{}' not found", rule.sink),
            ));
        }
    }
    Ok(())
}

/// Required adapter parameters
fn validate_params(blueprint: &LoggerBlueprint) -> Result<(), ContractError> {
    for (idx, source) in blueprint.sources.iter().enumerate() {
        let required: &[&str] = match source.source_type {
            SourceType::Random | SourceType::RandomString => &[],
            SourceType::Udp => &["bind", "variables"],
            SourceType::Loopback => &["device", "registers"],
        };
        for key in required {
            if !source.params.contains_key(*key) {
                return Err(ContractError::config_validation(
                    format!("sources[{idx}].params.{key}"),
                    format!("required for source type {:?}", source.source_type),
                ));
            }
        }
    }

    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        let required: &[&str] = match sink.sink_type {
            SinkType::Log => &[],
            SinkType::Csv => &["path"],
            SinkType::Udp => &["addr"],
            SinkType::Loopback => &["device"],
        };
        for key in required {
            if !sink.params.contains_key(*key) {
                return Err(ContractError::config_validation(
                    format!("sinks[{idx}].params.{key}"),
                    format!("required for sink type {:?}", sink.sink_type),
                ));
            }
        }
    }
    Ok(())
}
