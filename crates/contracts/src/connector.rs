//! Connector trait - establishing an adapter's underlying resource
//!
//! Retry policy lives with the adapters; the connector only knows how to make one attempt.

use crate::ContractError;

/// Single-attempt connection to a device, socket or broker
#[trait_variant::make(Connector: Send)]
pub trait LocalConnector {
    /// Handle produced by a successful attempt
    type Connection;

    /// Human-readable target (used for logging and errors)
    fn target(&self) -> String;

    /// Make one connection attempt
    ///
    /// # Errors
    /// Returns the reason this attempt failed; the caller decides whether to retry.
    async fn connect(&self) -> Result<Self::Connection, ContractError>;
}
