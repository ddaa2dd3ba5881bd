//! Name resolver
//!
//! Turns the declared variable names of every source, the sinks and the rename rules into one
//! collision-free column list per (source, sink) pair. Runs once when a logger is built.
//!
//! Per sink:
//! 1. apply that sink's rename rules to every source's names,
//! 2. if all names (and the sink's timestamp key) are unique, use them,
//! 3. otherwise drop the renames for this sink and prefix every variable of every source with
//!    `<source><delimiter>`, then check uniqueness again.

use std::collections::HashSet;

use contracts::RenameRules;
use tracing::{debug, warn};

use crate::error::LoggerError;

/// Declared names of one source
#[derive(Debug, Clone, Copy)]
pub struct SourceNames<'a> {
    pub name: &'a str,
    pub variables: &'a [String],
}

/// What the resolver needs to know about one sink
#[derive(Debug, Clone, Copy)]
pub struct SinkNames<'a> {
    pub name: &'a str,
    /// Reserved timestamp column, when the sink wants one
    pub timestamp_key: Option<&'a str>,
}

/// Final column names of one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkLayout {
    sink: String,
    timestamp_key: Option<String>,
    /// Final names per source, in source declaration order
    columns: Vec<Vec<String>>,
    prefixed: bool,
}

impl SinkLayout {
    pub fn sink(&self) -> &str {
        &self.sink
    }

    pub fn timestamp_key(&self) -> Option<&str> {
        self.timestamp_key.as_deref()
    }

    /// Final names for the source at `index` (declaration order)
    pub fn names(&self, index: usize) -> &[String] {
        self.columns
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the prefixing fallback was applied to this sink
    pub fn is_prefixed(&self) -> bool {
        self.prefixed
    }

    /// Number of columns in a row for this sink, timestamp included
    pub fn width(&self) -> usize {
        let variables: usize = self.columns.iter().map(Vec::len).sum();
        variables + usize::from(self.timestamp_key.is_some())
    }

    /// `[timestamp key] + names of every source`, in row order
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.width());
        header.extend(self.timestamp_key.iter().cloned());
        header.extend(self.columns.iter().flatten().cloned());
        header
    }
}

/// Resolved names for every (source, sink) pair; immutable once computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    sources: Vec<String>,
    layouts: Vec<SinkLayout>,
}

impl ResolvedMapping {
    /// Final names `source` uses when writing to `sink`
    pub fn names(&self, source: &str, sink: &str) -> Option<&[String]> {
        let index = self.sources.iter().position(|s| s == source)?;
        self.layout(sink).map(|layout| layout.names(index))
    }

    /// Layout of one sink
    pub fn layout(&self, sink: &str) -> Option<&SinkLayout> {
        self.layouts.iter().find(|l| l.sink == sink)
    }

    /// Layouts of all sinks, in sink declaration order
    pub fn layouts(&self) -> &[SinkLayout] {
        &self.layouts
    }

    /// Header of one sink
    pub fn header(&self, sink: &str) -> Option<Vec<String>> {
        self.layout(sink).map(SinkLayout::header)
    }
}

/// Resolve the final names of every source for every sink
///
/// # Errors
/// Returns [`LoggerError::UnresolvedCollision`] when prefixing cannot make a sink's names unique.
pub fn resolve(
    sources: &[SourceNames<'_>],
    sinks: &[SinkNames<'_>],
    rules: &RenameRules,
    delimiter: &str,
) -> Result<ResolvedMapping, LoggerError> {
    let layouts = sinks
        .iter()
        .map(|sink| resolve_sink(sources, sink, rules, delimiter))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedMapping {
        sources: sources.iter().map(|s| s.name.to_string()).collect(),
        layouts,
    })
}

fn resolve_sink(
    sources: &[SourceNames<'_>],
    sink: &SinkNames<'_>,
    rules: &RenameRules,
    delimiter: &str,
) -> Result<SinkLayout, LoggerError> {
    let renamed: Vec<Vec<String>> = sources
        .iter()
        .map(|source| {
            source
                .variables
                .iter()
                .map(|v| rules.apply(source.name, sink.name, v).to_string())
                .collect()
        })
        .collect();

    let Some(duplicate) = first_duplicate(sink.timestamp_key, &renamed) else {
        return Ok(layout(sink, renamed, false));
    };

    // Renames are discarded for the whole sink, even ones that were already unique
    debug!(
        sink = sink.name,
        column = %duplicate,
        "Name collision, prefixing every variable with its source name"
    );
    let prefixed: Vec<Vec<String>> = sources
        .iter()
        .map(|source| {
            source
                .variables
                .iter()
                .map(|v| format!("{}{delimiter}{v}", source.name))
                .collect()
        })
        .collect();

    if let Some(column) = first_duplicate(sink.timestamp_key, &prefixed) {
        warn!(sink = sink.name, column = %column, "Collision survives prefixing");
        return Err(LoggerError::UnresolvedCollision {
            sink: sink.name.to_string(),
            column,
        });
    }

    Ok(layout(sink, prefixed, true))
}

fn layout(sink: &SinkNames<'_>, columns: Vec<Vec<String>>, prefixed: bool) -> SinkLayout {
    SinkLayout {
        sink: sink.name.to_string(),
        timestamp_key: sink.timestamp_key.map(str::to_string),
        columns,
        prefixed,
    }
}

/// First name that appears twice, counting the reserved key as already taken
fn first_duplicate(reserved: Option<&str>, columns: &[Vec<String>]) -> Option<String> {
    let mut seen: HashSet<&str> = reserved.into_iter().collect();
    columns
        .iter()
        .flatten()
        .find(|name| !seen.insert(name.as_str()))
        .cloned()
}
