//! Source factory
//!
//! Builds a ready-to-read [`DataSource`] from a [`SourceConfig`]. Connection establishment
//! (with retry) happens here, so a source handed to a logger is always usable.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::params::{list_param, required_param};
use contracts::{ContractError, DataSource, SourceConfig, SourceType};
use tracing::info;

use crate::loopback::DeviceRegistry;
use crate::random::{RandomDataSource, RandomStringSource};
use crate::retry::ConnectPolicy;
use crate::udp::UdpListenerSource;

/// Create a source from its configuration
///
/// Loopback sources register (or reuse) their device in `devices`, so a sink built from the same
/// registry shares the register bank.
///
/// # Errors
/// Returns a configuration error for bad params, or a connection error once retries are exhausted.
pub async fn create_source(
    config: &SourceConfig,
    devices: &mut DeviceRegistry,
) -> Result<Arc<dyn DataSource>, ContractError> {
    let params = &config.params;
    let source: Arc<dyn DataSource> = match config.source_type {
        SourceType::Random => Arc::new(RandomDataSource::from_params(params)?),
        SourceType::RandomString => Arc::new(RandomStringSource::from_params(params)?),
        SourceType::Udp => {
            let bind: String = required_param(params, "bind")?;
            let variables = non_empty_list(params, "variables")?;
            let policy = ConnectPolicy::from_params(params)?;
            Arc::new(UdpListenerSource::bind(&config.name, &bind, variables, &policy).await?)
        }
        SourceType::Loopback => {
            let device: String = required_param(params, "device")?;
            let registers = non_empty_list(params, "registers")?;
            Arc::new(devices.device(&device).source(registers))
        }
    };

    info!(
        source = %config.name,
        source_type = ?config.source_type,
        variables = source.variable_names().len(),
        "Source created"
    );
    Ok(source)
}

fn non_empty_list(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Vec<String>, ContractError> {
    let list = list_param(params, key);
    if list.is_empty() {
        return Err(ContractError::config_validation(
            format!("params.{key}"),
            "must list at least one name",
        ));
    }
    Ok(list)
}
