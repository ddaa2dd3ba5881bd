//! Pipeline assembly and session statistics.

mod assemble;
mod stats;

pub use assemble::{preview_headers, Pipeline, PipelineConfig};
pub use stats::PipelineStats;
