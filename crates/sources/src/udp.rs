//! UDP listener source
//!
//! Receives JSON object datagrams (`{"name": value, ...}`) on a bound socket and buffers the
//! declared variables until the next tick reads them. Undeclared keys and non-scalar values
//! are ignored.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Connector, ContractError, DataSource, Reading, Value};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::buffered::{BufferPublisher, BufferedSource};
use crate::retry::ConnectPolicy;

/// Largest datagram accepted
const MAX_DATAGRAM: usize = 64 * 1024;

/// Pause after a failed receive, doubled per consecutive failure
const RECEIVE_BACKOFF: Duration = Duration::from_millis(50);
const MAX_RECEIVE_BACKOFF: Duration = Duration::from_secs(2);
/// Consecutive failed receives before the listener gives up
const MAX_RECEIVE_ERRORS: u32 = 20;

/// Back-off state for consecutive receive failures
#[derive(Debug, Default)]
struct ReceiveBackoff {
    consecutive: u32,
}

impl ReceiveBackoff {
    /// Delay before the next receive, or `None` once the listener should stop
    fn on_error(&mut self) -> Option<Duration> {
        self.consecutive += 1;
        if self.consecutive >= MAX_RECEIVE_ERRORS {
            return None;
        }
        let delay = RECEIVE_BACKOFF.saturating_mul(1 << (self.consecutive - 1).min(16));
        Some(delay.min(MAX_RECEIVE_BACKOFF))
    }

    fn on_success(&mut self) {
        self.consecutive = 0;
    }
}

/// Binds a UDP socket (one attempt per `connect`)
#[derive(Debug, Clone)]
pub struct UdpBindConnector {
    bind: String,
}

impl UdpBindConnector {
    pub fn new(bind: impl Into<String>) -> Self {
        Self { bind: bind.into() }
    }
}

impl Connector for UdpBindConnector {
    type Connection = UdpSocket;

    fn target(&self) -> String {
        self.bind.clone()
    }

    async fn connect(&self) -> Result<UdpSocket, ContractError> {
        UdpSocket::bind(&self.bind).await.map_err(ContractError::from)
    }
}

/// Source fed by JSON datagrams
pub struct UdpListenerSource {
    name: String,
    inner: BufferedSource,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl UdpListenerSource {
    /// Bind `bind` under `policy` and start receiving in the background
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns [`ContractError::Connection`] when the socket cannot be bound.
    pub async fn bind(
        name: impl Into<String>,
        bind: &str,
        variables: Vec<String>,
        policy: &ConnectPolicy,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let socket = policy.establish(&UdpBindConnector::new(bind)).await?;
        let local_addr = socket.local_addr()?;

        let (inner, publisher) = BufferedSource::new(variables);
        let task = tokio::spawn(receive_loop(name.clone(), Arc::new(socket), publisher));

        info!(source = %name, addr = %local_addr, "UDP listener started");
        Ok(Self {
            name,
            inner,
            local_addr,
            task,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl DataSource for UdpListenerSource {
    fn variable_names(&self) -> &[String] {
        self.inner.variable_names()
    }

    fn read(&self) -> Result<Reading, ContractError> {
        if self.task.is_finished() {
            return Err(ContractError::source_unavailable(format!(
                "UDP listener '{}' stopped",
                self.name
            )));
        }
        self.inner.read()
    }
}

impl Drop for UdpListenerSource {
    fn drop(&mut self) {
        self.task.abort();
        debug!(source = %self.name, "UDP listener stopped");
    }
}

async fn receive_loop(name: String, socket: Arc<UdpSocket>, publisher: BufferPublisher) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut backoff = ReceiveBackoff::default();
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => {
                backoff.on_success();
                received
            }
            Err(e) => {
                record_datagram(&name, "error");
                match backoff.on_error() {
                    Some(delay) => {
                        warn!(source = %name, error = %e, retry_ms = delay.as_millis() as u64, "UDP receive failed");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => {
                        error!(source = %name, error = %e, "UDP receive keeps failing, stopping listener");
                        return;
                    }
                }
            }
        };

        match decode_datagram(&buf[..len]) {
            Ok(updates) => {
                let accepted = publisher.publish_all(updates);
                debug!(source = %name, %peer, accepted, "Datagram buffered");
                record_datagram(&name, "ok");
            }
            Err(e) => {
                warn!(source = %name, %peer, error = %e, "Dropping malformed datagram");
                record_datagram(&name, "malformed");
            }
        }
    }
}

fn record_datagram(source: &str, status: &'static str) {
    metrics::counter!(
        "daq_logger_udp_datagrams_total",
        "source" => source.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Decode one datagram into scalar updates
pub(crate) fn decode_datagram(bytes: &[u8]) -> Result<Vec<(String, Value)>, serde_json::Error> {
    let object: HashMap<String, serde_json::Value> = serde_json::from_slice(bytes)?;
    Ok(object
        .into_iter()
        .filter_map(|(key, raw)| {
            serde_json::from_value::<Value>(raw)
                .ok()
                .map(|value| (key, value))
        })
        .collect())
}
