//! DataSource trait - acquisition side of an adapter

use crate::{ContractError, Reading};

/// Data source trait
///
/// Declares a fixed, ordered set of variable names and produces their current values on demand.
/// Implementations are shared through `Arc` and must serialize their own I/O internally.
///
/// # Example
///
/// ```ignore
/// let source: Arc<dyn DataSource> = Arc::new(RandomDataSource::new(config));
/// let reading = source.read()?;
/// for name in source.variable_names() {
///     println!("{name}: {:?}", reading.get(name));
/// }
/// ```
pub trait DataSource: Send + Sync {
    /// Declared variable names; fixed after construction and unique within the source
    fn variable_names(&self) -> &[String];

    /// Read the current values
    ///
    /// Returned keys are a subset of [`variable_names`](Self::variable_names); a declared name that
    /// is absent, or mapped to `None`, is missing this tick.
    ///
    /// # Errors
    /// Returns [`ContractError::SourceUnavailable`] (or another adapter error) when nothing can be read.
    fn read(&self) -> Result<Reading, ContractError>;
}
