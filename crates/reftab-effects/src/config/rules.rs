//! Rule entries of the configuration file.

use crate::error::RuleError;
use crate::predicate::{ComparisonSpec, Predicate, PredicateOptions};
use crate::rules::{MetaValueMap, RuleSpec, TableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Comparison settings for one mode field. Omitted wildcards fall back to
/// the file's `default_wildcards`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FieldConfig {
    #[serde(default)]
    pub op: Predicate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcards: Option<Vec<String>>,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            op: Predicate::Equals,
            wildcards: None,
            case_sensitive: true,
        }
    }
}

fn default_case_sensitive() -> bool {
    true
}

/// Mode fields, either as bare names or with per-field settings:
///
/// ```yaml
/// mode_fields: [opt_elem, cenwave]
/// # or
/// mode_fields:
///   opt_elem: {}
///   cenwave: { wildcards: ["ANY", "N/A"] }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ModeFields {
    Names(Vec<String>),
    Specs(BTreeMap<String, FieldConfig>),
}

impl Default for ModeFields {
    fn default() -> Self {
        ModeFields::Names(Vec::new())
    }
}

impl ModeFields {
    pub fn is_empty(&self) -> bool {
        match self {
            ModeFields::Names(names) => names.is_empty(),
            ModeFields::Specs(specs) => specs.is_empty(),
        }
    }

    fn comparison_specs(&self, default_wildcards: &[String]) -> Vec<(String, ComparisonSpec)> {
        let spec = |field: &FieldConfig| ComparisonSpec {
            op: field.op,
            options: PredicateOptions {
                wildcards: field
                    .wildcards
                    .clone()
                    .unwrap_or_else(|| default_wildcards.to_vec()),
                case_sensitive: field.case_sensitive,
            },
        };
        match self {
            ModeFields::Names(names) => names
                .iter()
                .map(|name| (name.clone(), spec(&FieldConfig::default())))
                .collect(),
            ModeFields::Specs(specs) => specs
                .iter()
                .map(|(name, field)| (name.clone(), spec(field)))
                .collect(),
        }
    }
}

/// A rule added to (or overriding) the registry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuleConfig {
    pub instrument: String,
    pub filekind: String,
    /// Display name; defaults to `<INSTRUMENT><FILEKIND>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub mode_fields: ModeFields,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metavalues: MetaValueMap,
    /// Select every row. Must be set explicitly for a rule without fields.
    #[serde(default)]
    pub match_all: bool,
}

impl RuleConfig {
    pub fn table_kind(&self) -> TableKind {
        TableKind::new(&self.instrument, &self.filekind)
    }

    pub fn rule_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!(
                "{}{}",
                self.instrument.to_uppercase(),
                self.filekind.to_uppercase()
            )
        })
    }

    /// Build the rule, filling omitted wildcards from `default_wildcards`.
    pub fn to_rule_spec(&self, default_wildcards: &[String]) -> Result<RuleSpec, RuleError> {
        let name = self.rule_name();
        let mut rule = if self.match_all && self.mode_fields.is_empty() {
            RuleSpec::match_all(name)
        } else {
            RuleSpec::new(name, self.mode_fields.comparison_specs(default_wildcards))?
        };
        for (field, aliases) in &self.metavalues {
            for (raw, substitute) in aliases {
                rule = rule.with_metavalue(field, raw, substitute.clone());
            }
        }
        Ok(rule)
    }
}
