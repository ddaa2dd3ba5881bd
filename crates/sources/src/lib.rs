//! # Sources
//!
//! Data source adapters and the connection retry policy.
//!
//! ## Adapters
//! - [`RandomDataSource`] / [`RandomStringSource`]: synthetic data with configurable missing rates
//! - [`BufferedSource`]: push-buffered handoff for event-driven producers
//! - [`UdpListenerSource`]: JSON datagrams feeding a [`BufferedSource`]
//! - [`LoopbackDevice`]: dual-role register bank (source and sink over one handle)
//!
//! ## Usage
//! ```ignore
//! let mut devices = DeviceRegistry::new();
//! let source = create_source(&config, &mut devices).await?;
//! let reading = source.read()?;
//! ```

mod buffered;
mod factory;
mod loopback;
mod random;
mod retry;
mod udp;

pub use buffered::{BufferPublisher, BufferedSource};
pub use factory::create_source;
pub use loopback::{DeviceRegistry, LoopbackDevice, LoopbackSink, LoopbackSource};
pub use random::{RandomDataSource, RandomSourceConfig, RandomStringSource};
pub use retry::ConnectPolicy;
pub use udp::{UdpBindConnector, UdpListenerSource};
