//! Predicate options for modifying matching behavior.

use serde::{Deserialize, Serialize};

/// The cell token that matches any requested mode value.
pub const DEFAULT_WILDCARD: &str = "ANY";

/// Options that modify predicate matching behavior.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PredicateOptions {
    /// Table cell values that match anything
    #[serde(default = "default_wildcards")]
    pub wildcards: Vec<String>,

    /// Whether text comparison is case-sensitive (default: true)
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

impl PredicateOptions {
    /// Options with a specific wildcard set and case-sensitive text matching.
    pub fn with_wildcards<I, S>(wildcards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wildcards: wildcards.into_iter().map(Into::into).collect(),
            case_sensitive: true,
        }
    }
}

impl Default for PredicateOptions {
    fn default() -> Self {
        Self {
            wildcards: default_wildcards(),
            case_sensitive: true,
        }
    }
}

pub(crate) fn default_wildcards() -> Vec<String> {
    vec![DEFAULT_WILDCARD.to_string()]
}

fn default_case_sensitive() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_options_default() {
        let options = PredicateOptions::default();
        assert_eq!(options.wildcards, vec!["ANY".to_string()]);
        assert!(options.case_sensitive);
    }

    #[test]
    fn test_predicate_options_serde_defaults() {
        let options: PredicateOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PredicateOptions::default());

        let options: PredicateOptions =
            serde_json::from_str(r#"{"wildcards": ["ANY", "N/A"], "case_sensitive": false}"#)
                .unwrap();
        assert_eq!(options.wildcards.len(), 2);
        assert!(!options.case_sensitive);
    }
}
