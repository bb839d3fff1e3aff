//! Rule specifications: which fields define a table's "mode".

use crate::error::RuleError;
use crate::predicate::{ComparisonSpec, ScalarValue, Target};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A reference-table type, e.g. `(cos, disptab)`. Case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKind {
    instrument: String,
    kind: String,
}

impl TableKind {
    pub fn new(instrument: &str, kind: &str) -> Self {
        Self {
            instrument: instrument.to_lowercase(),
            kind: kind.to_lowercase(),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Registry key: `<instrument>_<kind>`, lowercase.
    pub fn key(&self) -> String {
        format!("{}_{}", self.instrument, self.kind)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Replacement for an aliased header value: one value or a set of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Substitute {
    One(String),
    Many(Vec<String>),
}

impl Substitute {
    fn to_target(&self) -> Target {
        match self {
            Substitute::One(value) => Target::One(ScalarValue::coerce(value)),
            Substitute::Many(values) => {
                Target::AnyOf(values.iter().map(|v| ScalarValue::coerce(v)).collect())
            }
        }
    }
}

/// Field name to (raw header value to substitute).
pub type MetaValueMap = BTreeMap<String, BTreeMap<String, Substitute>>;

/// How rows of one table kind are selected for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSpec {
    name: String,
    mode_fields: BTreeMap<String, ComparisonSpec>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metavalues: MetaValueMap,
}

impl RuleSpec {
    /// Create a rule from its mode fields. Field names are lowercased.
    ///
    /// An empty field set is rejected; use [`RuleSpec::match_all`] when every
    /// row should be considered relevant.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (S, ComparisonSpec)>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mode_fields: BTreeMap<String, ComparisonSpec> = fields
            .into_iter()
            .map(|(field, spec)| (field.as_ref().to_lowercase(), spec))
            .collect();
        if mode_fields.is_empty() {
            return Err(RuleError::EmptyModeFields(name));
        }
        Ok(Self {
            name,
            mode_fields,
            metavalues: MetaValueMap::new(),
        })
    }

    /// A rule with no mode fields: every row of the table is selected.
    pub fn match_all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode_fields: BTreeMap::new(),
            metavalues: MetaValueMap::new(),
        }
    }

    /// Add a meta-value substitution for `field`: a dataset value `raw` is
    /// replaced by `substitute` before rows are selected.
    pub fn with_metavalue(mut self, field: &str, raw: &str, substitute: Substitute) -> Self {
        self.metavalues
            .entry(field.to_lowercase())
            .or_default()
            .insert(raw.to_string(), substitute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode_fields(&self) -> &BTreeMap<String, ComparisonSpec> {
        &self.mode_fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.mode_fields.keys().map(String::as_str)
    }

    pub fn metavalues(&self) -> &MetaValueMap {
        &self.metavalues
    }

    pub fn is_match_all(&self) -> bool {
        self.mode_fields.is_empty()
    }

    /// Resolve the target for `field` from a raw dataset value, applying
    /// any meta-value substitution before numeric coercion.
    pub fn target_for(&self, field: &str, raw: &str) -> Target {
        let substitute = self
            .metavalues
            .get(field)
            .and_then(|aliases| aliases.get(raw).or_else(|| aliases.get(raw.trim())));
        match substitute {
            Some(substitute) => substitute.to_target(),
            None => Target::One(ScalarValue::coerce(raw)),
        }
    }
}
