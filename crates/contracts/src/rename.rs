//! Per (source, sink) variable rename rules

use std::collections::{BTreeMap, HashMap};

use crate::RenameRuleConfig;

/// Rename rules keyed by `(source name, sink name)`, each mapping old variable name -> new name.
///
/// Supplied once when a logger is built; immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameRules {
    rules: BTreeMap<(String, String), HashMap<String, String>>,
}

impl RenameRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the mapping for one `(source, sink)` pair
    pub fn with_rule<I, K, V>(mut self, source: &str, sink: &str, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (old, new) in mapping {
            self.insert(source, sink, old, new);
        }
        self
    }

    /// Add a single rename for one `(source, sink)` pair
    pub fn insert(
        &mut self,
        source: &str,
        sink: &str,
        old: impl Into<String>,
        new: impl Into<String>,
    ) {
        self.rules
            .entry((source.to_string(), sink.to_string()))
            .or_default()
            .insert(old.into(), new.into());
    }

    /// Mapping for a pair, if any
    pub fn mapping(&self, source: &str, sink: &str) -> Option<&HashMap<String, String>> {
        self.rules.get(&(source.to_string(), sink.to_string()))
    }

    /// Name `variable` takes when `source` writes to `sink`
    pub fn apply<'a>(&'a self, source: &str, sink: &str, variable: &'a str) -> &'a str {
        self.mapping(source, sink)
            .and_then(|m| m.get(variable))
            .map_or(variable, String::as_str)
    }

    /// All `(source, sink)` pairs that carry rules
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.keys().map(|(so, si)| (so.as_str(), si.as_str()))
    }
}

impl From<&[RenameRuleConfig]> for RenameRules {
    fn from(configs: &[RenameRuleConfig]) -> Self {
        configs.iter().fold(Self::new(), |rules, config| {
            rules.with_rule(&config.source, &config.sink, config.mapping.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_passes_unmatched_names_through() {
        let rules = RenameRules::new().with_rule("Sou1", "OutA", [("RandData0", "R0")]);

        assert_eq!(rules.apply("Sou1", "OutA", "RandData0"), "R0");
        assert_eq!(rules.apply("Sou1", "OutA", "RandData1"), "RandData1");
        assert_eq!(rules.apply("Sou1", "OutB", "RandData0"), "RandData0");
        assert_eq!(rules.apply("Sou2", "OutA", "RandData0"), "RandData0");
    }

    #[test]
    fn repeated_pairs_merge() {
        let configs = vec![
            RenameRuleConfig {
                source: "s".into(),
                sink: "o".into(),
                mapping: HashMap::from([("a".to_string(), "A".to_string())]),
            },
            RenameRuleConfig {
                source: "s".into(),
                sink: "o".into(),
                mapping: HashMap::from([("b".to_string(), "B".to_string())]),
            },
        ];

        let rules = RenameRules::from(configs.as_slice());
        assert_eq!(rules.pairs().count(), 1);
        assert_eq!(rules.mapping("s", "o").map(HashMap::len), Some(2));
    }
}
