//! UdpPublishSink - fire-and-forget JSON datagrams
//!
//! Each row's present values are sent as one JSON object. A row with nothing present produces
//! no datagram. Sends never block the tick: a full socket buffer fails this sink for this tick.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::SocketAddr;

use contracts::params::{param_or, required_param};
use contracts::{ContractError, DataSink, Row, Value};
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Configuration for UdpPublishSink
#[derive(Debug, Clone)]
pub struct UdpSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Local bind address
    pub bind: String,
    /// Max packet size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl UdpSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        Ok(Self {
            addr: required_param(params, "addr")?,
            bind: param_or(params, "bind", "0.0.0.0:0".to_string())?,
            max_packet_size: param_or(params, "max_packet_size", 65000)?,
        })
    }
}

/// Sink that publishes rows over UDP
pub struct UdpPublishSink {
    name: String,
    config: UdpSinkConfig,
    socket: UdpSocket,
}

impl UdpPublishSink {
    /// Bind a local socket and connect it to the target
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(name: impl Into<String>, config: UdpSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ContractError::Other(format!(
                "{name}: udp sink must be created inside a tokio runtime"
            )));
        }

        let std_socket = std::net::UdpSocket::bind(&config.bind)?;
        std_socket.connect(config.addr)?;
        std_socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(std_socket)?;

        debug!(sink = %name, addr = %config.addr, "UdpPublishSink connected");
        Ok(Self {
            name,
            config,
            socket,
        })
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        Self::new(name, UdpSinkConfig::from_params(params)?)
    }

    /// Encode the present values of a row; `None` when nothing is present
    fn encode(row: &Row) -> Result<Option<Vec<u8>>, ContractError> {
        let values: BTreeMap<&str, &Value> = row.present().collect();
        if values.is_empty() {
            return Ok(None);
        }
        serde_json::to_vec(&values)
            .map(Some)
            .map_err(|e| ContractError::sink_write(format!("json error: {e}")))
    }

    fn send_error(&self, err: io::Error) -> ContractError {
        if err.kind() == io::ErrorKind::WouldBlock {
            warn!(sink = %self.name, "Socket buffer full, dropping datagram");
            ContractError::sink_write(format!("{}: socket buffer full", self.name))
        } else {
            ContractError::sink_write(format!("{}: send failed: {err}", self.name))
        }
    }
}

impl DataSink for UdpPublishSink {
    fn needs_timestamp(&self) -> bool {
        false
    }

    #[instrument(name = "udp_sink_write", skip(self, row), fields(sink = %self.name))]
    fn write(&self, row: &Row) -> Result<(), ContractError> {
        let Some(data) = Self::encode(row)? else {
            debug!(sink = %self.name, "Nothing present, skipping datagram");
            return Ok(());
        };

        if data.len() > self.config.max_packet_size {
            return Err(ContractError::sink_write(format!(
                "{}: datagram of {} bytes exceeds limit of {}",
                self.name,
                data.len(),
                self.config.max_packet_size
            )));
        }

        let sent = self
            .socket
            .try_send(&data)
            .map_err(|e| self.send_error(e))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}
