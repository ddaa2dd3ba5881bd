//! Typed access to adapter `params` tables

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::ContractError;

/// Parse `key` from `params`, falling back to `default` when absent
pub fn param_or<T>(
    params: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: Display,
{
    match params.get(key) {
        Some(raw) => parse(key, raw),
        None => Ok(default),
    }
}

/// Parse a required `key` from `params`
pub fn required_param<T>(params: &HashMap<String, String>, key: &str) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = params
        .get(key)
        .ok_or_else(|| ContractError::config_validation(format!("params.{key}"), "missing"))?;
    parse(key, raw)
}

/// Comma-separated list parameter (empty entries dropped)
pub fn list_param(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e| {
        ContractError::config_validation(
            format!("params.{key}"),
            format!("invalid value '{raw}': {e}"),
        )
    })
}
