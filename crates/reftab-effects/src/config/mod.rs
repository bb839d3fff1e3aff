//! Configuration for the table-effects core.
//!
//! Everything is optional: an empty file yields the built-in catalog, the
//! default placeholder tokens and the `ANY` wildcard.
//!
//! ```yaml
//! meaningless_references: ["n/a", "undefined", "not found"]
//! default_wildcards: ["ANY"]
//! include_builtin_rules: true
//! rules:
//!   - instrument: cos
//!     filekind: flatfile
//!     mode_fields: [opt_elem, segment]
//! header_stubs:
//!   cos:
//!     LBYX01010: { opt_elem: G140L, cenwave: "1280" }
//! ```

mod rules;

pub use rules::{FieldConfig, ModeFields, RuleConfig};

use crate::decision::DEFAULT_MEANINGLESS_REFERENCES;
use crate::params::DatasetParameters;
use crate::predicate::DEFAULT_WILDCARD;
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Case-insensitive prefixes of reference values that mean
    /// "no calibration assigned".
    #[serde(default = "default_meaningless_references")]
    pub meaningless_references: Vec<String>,

    /// Wildcards for every mode field that does not list its own, built-in
    /// rules included.
    #[serde(default = "default_wildcards")]
    pub default_wildcards: Vec<String>,

    /// Start from the built-in COS/STIS catalog (default: true)
    #[serde(default = "default_include_builtin_rules")]
    pub include_builtin_rules: bool,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Instrument to dataset id to substitute headers. Transitional; only
    /// consulted when a dataset's own parameters are incomplete.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header_stubs: BTreeMap<String, BTreeMap<String, DatasetParameters>>,
}

fn default_meaningless_references() -> Vec<String> {
    DEFAULT_MEANINGLESS_REFERENCES
        .iter()
        .map(|token| token.to_string())
        .collect()
}

fn default_wildcards() -> Vec<String> {
    vec![DEFAULT_WILDCARD.to_string()]
}

fn default_include_builtin_rules() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meaningless_references: default_meaningless_references(),
            default_wildcards: default_wildcards(),
            include_builtin_rules: true,
            rules: Vec::new(),
            header_stubs: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        // An empty document deserializes to unit, not to an empty mapping.
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(token) = self
            .meaningless_references
            .iter()
            .find(|token| token.trim().is_empty())
        {
            anyhow::bail!(
                "Empty meaningless reference token {:?} would match every reference",
                token
            );
        }

        let mut seen = HashSet::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.instrument.trim().is_empty() || rule.filekind.trim().is_empty() {
                anyhow::bail!("Rule #{} must name both an instrument and a filekind", idx + 1);
            }
            let kind = rule.table_kind();
            if !seen.insert(kind.key()) {
                anyhow::bail!("Duplicate rule for {} {}", kind.instrument(), kind.kind());
            }
            if rule.mode_fields.is_empty() && !rule.match_all {
                anyhow::bail!(
                    "Rule for {} {} has no mode fields. Set 'match_all: true' to select every row",
                    kind.instrument(),
                    kind.kind()
                );
            }
            if !rule.mode_fields.is_empty() && rule.match_all {
                anyhow::bail!(
                    "Rule for {} {} sets 'match_all' but also lists mode fields",
                    kind.instrument(),
                    kind.kind()
                );
            }
        }

        if let Some(instrument) = self.header_stubs.keys().find(|i| i.trim().is_empty()) {
            anyhow::bail!("Header stubs declared for an empty instrument name {:?}", instrument);
        }

        Ok(())
    }

    /// Build the rule registry this configuration describes.
    pub fn build_registry(&self) -> Result<RuleRegistry, anyhow::Error> {
        let mut registry = if self.include_builtin_rules {
            RuleRegistry::builtin_with_wildcards(&self.default_wildcards)?
        } else {
            RuleRegistry::empty()
        };

        for rule in &self.rules {
            let spec = rule.to_rule_spec(&self.default_wildcards)?;
            if let Some(replaced) = registry.insert(rule.table_kind(), spec) {
                debug!("Configured rule replaces {} for {}", replaced.name(), rule.table_kind());
            }
        }

        for (instrument, datasets) in &self.header_stubs {
            let stubs = registry.header_stubs_mut(instrument);
            for (dataset, headers) in datasets {
                stubs.insert(dataset, headers.lowercased());
            }
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{evaluate, Verdict};
    use crate::table::Table;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_defaults() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_wildcards, vec!["ANY".to_string()]);
        assert_eq!(config.meaningless_references.len(), 3);
        assert_eq!(config.build_registry().unwrap().len(), 32);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
meaningless_references: ["n/a", "none"]
default_wildcards: ["ANY", "*"]
rules:
  - instrument: COS
    filekind: FLATFILE
    mode_fields: [opt_elem, segment]
  - instrument: cos
    filekind: disptab
    name: Custom
    mode_fields:
      opt_elem: { wildcards: [] }
header_stubs:
  cos:
    LZZZ01010: { OPT_ELEM: G130M, CENWAVE: "1291" }
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert!(config.include_builtin_rules);

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.len(), 33);
        let flat = registry.lookup("cos", "flatfile").unwrap();
        assert_eq!(
            flat.mode_fields()["opt_elem"].options.wildcards,
            vec!["ANY".to_string(), "*".to_string()]
        );
        let disp = registry.lookup("cos", "disptab").unwrap();
        assert_eq!(disp.name(), "Custom");
        assert!(disp.mode_fields()["opt_elem"].options.wildcards.is_empty());

        let stub = registry.header_stub("cos", "lzzz01010:lzzz01abq").unwrap();
        assert_eq!(stub.get("cenwave"), Some("1291"));
        assert!(registry.header_stub("cos", "LBYX01010").is_some());
    }

    #[test]
    fn test_default_wildcards_apply_to_builtin_rules() {
        let config = Config::from_yaml_str(r#"default_wildcards: ["*"]"#).unwrap();
        let registry = config.build_registry().unwrap();
        let rule = registry.lookup("cos", "disptab").unwrap();
        assert_eq!(
            rule.mode_fields()["opt_elem"].options.wildcards,
            vec!["*".to_string()]
        );

        let columns = ["OPT_ELEM", "CENWAVE", "SEGMENT"];
        let old = Table::build(columns, [["*", "1280", "1"]]).unwrap();
        let new = Table::build(columns, [["*", "1280", "2"]]).unwrap();
        let params: DatasetParameters = [("OPT_ELEM", "G140L"), ("CENWAVE", "1280")]
            .into_iter()
            .collect();
        assert_eq!(evaluate(rule, &params, &old, &new).verdict, Verdict::Different);
    }

    #[test]
    fn test_without_builtin_rules() {
        let yaml = r#"
include_builtin_rules: false
rules:
  - instrument: wfc3
    filekind: pctab
    match_all: true
"#;
        let registry = Config::from_yaml_str(yaml).unwrap().build_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("wfc3", "pctab").unwrap().is_match_all());
        assert!(registry.lookup("cos", "disptab").is_err());
        assert!(registry.header_stub("cos", "LBYX01010").is_none());
    }

    #[test]
    fn test_rejects_empty_rule() {
        let yaml = r#"
rules:
  - instrument: cos
    filekind: gsagtab
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("match_all"));
    }

    #[test]
    fn test_rejects_duplicate_rules() {
        let yaml = r#"
rules:
  - instrument: cos
    filekind: flatfile
    mode_fields: [segment]
  - instrument: COS
    filekind: FlatFile
    mode_fields: [opt_elem]
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate rule"));
    }

    #[test]
    fn test_rejects_empty_names() {
        let yaml = r#"
rules:
  - instrument: ""
    filekind: flatfile
    mode_fields: [segment]
"#;
        assert!(Config::from_yaml_str(yaml).is_err());

        let yaml = r#"meaningless_references: ["n/a", " "]"#;
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_wildcards: [\"*\"]").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.default_wildcards, vec!["*".to_string()]);

        assert!(Config::from_file("/nonexistent/reftab.yaml").is_err());
    }
}
