//! Sink factory

use std::sync::Arc;

use contracts::params::{param_or, required_param};
use contracts::{ContractError, DataSink, SinkConfig, SinkType, DEFAULT_TIMESTAMP_KEY};
use sources::DeviceRegistry;
use tracing::info;

use crate::{CsvSink, CsvSinkConfig, LogSink, UdpPublishSink};

/// Create a sink from its configuration
///
/// Loopback sinks share the register bank of the device with the same name in `devices`.
pub fn create_sink(
    config: &SinkConfig,
    devices: &mut DeviceRegistry,
) -> Result<Arc<dyn DataSink>, ContractError> {
    let params = &config.params;
    let sink: Arc<dyn DataSink> = match config.sink_type {
        SinkType::Csv => Arc::new(CsvSink::from_params(&config.name, params)?),
        SinkType::Log => Arc::new(LogSink::from_params(&config.name, params)?),
        SinkType::Udp => Arc::new(UdpPublishSink::from_params(&config.name, params)?),
        SinkType::Loopback => {
            let device: String = required_param(params, "device")?;
            Arc::new(devices.device(&device).sink())
        }
    };

    info!(
        sink = %config.name,
        sink_type = ?config.sink_type,
        timestamp = sink.needs_timestamp(),
        "Sink created"
    );
    Ok(sink)
}

/// Timestamp column a sink built from `config` would reserve, without creating the sink
///
/// Lets callers preview resolved headers without opening files or sockets.
pub fn timestamp_column(config: &SinkConfig) -> Result<Option<String>, ContractError> {
    let params = &config.params;
    match config.sink_type {
        SinkType::Csv => {
            let file = CsvSinkConfig::from_params(params)?;
            Ok(file.timestamp.then_some(file.timestamp_key))
        }
        SinkType::Log => Ok(param_or(params, "timestamp", true)?
            .then(|| DEFAULT_TIMESTAMP_KEY.to_string())),
        SinkType::Udp | SinkType::Loopback => Ok(None),
    }
}
