//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Adapter crates and the logger core depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Capability model
//! - [`DataSource`]: fixed, ordered variable names plus an on-demand `read`
//! - [`DataSink`]: consumes one [`Row`] per tick, optionally with a timestamp column and a
//!   write-once [`FixedHeader`]
//! - [`Connector`]: async establishment of an adapter's underlying resource, driven by a retry policy
//!
//! A device that can be both read and written exposes two independent capability objects
//! sharing one internally synchronised handle; nothing is detected at runtime.

mod blueprint;
mod connector;
mod error;
pub mod params;
mod rename;
mod sink;
mod source;
mod tick;
mod value;

pub use blueprint::*;
pub use connector::{Connector, LocalConnector};
pub use error::*;
pub use rename::RenameRules;
pub use sink::{DataSink, FixedHeader, DEFAULT_TIMESTAMP_KEY};
pub use source::DataSource;
pub use tick::{SinkFailureKind, TickOutcome};
pub use value::{Reading, Row, Value};
