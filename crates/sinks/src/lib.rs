//! # Sinks
//!
//! Sink adapters. Each implements [`contracts::DataSink`] and is created either directly or
//! through [`create_sink`] from a [`contracts::SinkConfig`].
//!
//! - [`CsvSink`]: delimited file with a write-once header
//! - [`LogSink`]: rows as tracing events
//! - [`UdpPublishSink`]: present values as JSON datagrams
//!
//! Loopback sinks come from [`sources::LoopbackDevice::sink`].

mod factory;
mod file;
mod log;
mod udp;

pub use factory::{create_sink, timestamp_column};
pub use file::{CsvSink, CsvSinkConfig};
pub use log::LogSink;
pub use udp::{UdpPublishSink, UdpSinkConfig};
