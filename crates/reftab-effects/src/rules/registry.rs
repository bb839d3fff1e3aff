//! Static registry mapping `(instrument, table kind)` to a rule.

use super::builtin;
use super::spec::{RuleSpec, TableKind};
use super::stubs::HeaderStubs;
use crate::error::RuleError;
use crate::params::DatasetParameters;
use crate::predicate::DEFAULT_WILDCARD;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

static BUILTIN: Lazy<RuleRegistry> = Lazy::new(RuleRegistry::builtin);

/// The built-in registry, built on first use and shared afterwards.
pub fn builtin_registry() -> &'static RuleRegistry {
    &BUILTIN
}

/// Lookup table of comparison rules.
///
/// Populated once and then only read; share it by reference across threads.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, RuleSpec>,
    /// Instrument (lowercase) to transitional header stubs.
    stubs: HashMap<String, HeaderStubs>,
}

impl RuleRegistry {
    /// A registry with no rules: every lookup fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in COS and STIS catalog, with the COS header stubs.
    ///
    /// If the catalog cannot be built the registry is empty, so every lookup
    /// fails and every dataset is reprocessed.
    pub fn builtin() -> Self {
        Self::builtin_with_wildcards(&[DEFAULT_WILDCARD.to_string()]).unwrap_or_else(|err| {
            error!("Built-in rule catalog is invalid: {err}");
            Self::empty()
        })
    }

    /// The built-in catalog with `wildcards` on every mode field.
    pub fn builtin_with_wildcards(wildcards: &[String]) -> Result<Self, RuleError> {
        let mut registry = Self::empty();
        for (instrument, kind, rule) in builtin::catalog(wildcards)? {
            registry.insert(TableKind::new(instrument, kind), rule);
        }
        registry.set_header_stubs("cos", HeaderStubs::cos_transitional());
        registry.set_header_stubs("stis", HeaderStubs::new());
        Ok(registry)
    }

    /// Add or replace a rule, returning the one it replaced.
    pub fn insert(&mut self, kind: TableKind, rule: RuleSpec) -> Option<RuleSpec> {
        self.rules.insert(kind.key(), rule)
    }

    /// Attach header stubs to an instrument family.
    pub fn set_header_stubs(&mut self, instrument: &str, stubs: HeaderStubs) {
        self.stubs.insert(instrument.to_lowercase(), stubs);
    }

    /// The stub table of an instrument family, created empty if absent.
    pub fn header_stubs_mut(&mut self, instrument: &str) -> &mut HeaderStubs {
        self.stubs.entry(instrument.to_lowercase()).or_default()
    }

    /// Drop every header stub table, leaving the rules untouched.
    pub fn without_header_stubs(mut self) -> Self {
        self.stubs.clear();
        self
    }

    /// Find the rule for a table kind.
    pub fn lookup(&self, instrument: &str, table_kind: &str) -> Result<&RuleSpec, RuleError> {
        let key = TableKind::new(instrument, table_kind).key();
        debug!("Instantiating rules for reference type {key}.");
        self.rules.get(&key).ok_or_else(|| RuleError::UnknownRule {
            instrument: instrument.to_string(),
            filekind: table_kind.to_string(),
        })
    }

    /// Substitute headers for a dataset, if its instrument carries a stub.
    pub fn header_stub(&self, instrument: &str, dataset: &str) -> Option<&DatasetParameters> {
        self.stubs
            .get(&instrument.to_lowercase())
            .and_then(|stubs| stubs.get(dataset))
    }

    /// All rules, ordered by registry key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RuleSpec)> {
        self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::ComparisonSpec;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = RuleRegistry::builtin();
        let rule = registry.lookup("COS", "DISPTAB").unwrap();
        assert_eq!(rule.name(), "COSDISPTAB");
        let fields: Vec<&str> = rule.field_names().collect();
        assert_eq!(fields, vec!["cenwave", "opt_elem"]);
    }

    #[test]
    fn test_unknown_rule() {
        let registry = RuleRegistry::builtin();
        let err = registry.lookup("acs", "biasfile").unwrap_err();
        assert!(matches!(err, RuleError::UnknownRule { .. }));
        assert!(RuleRegistry::empty().lookup("cos", "disptab").is_err());
    }

    #[test]
    fn test_stis_ccdtab_fields() {
        let registry = builtin_registry();
        let fields: Vec<&str> = registry
            .lookup("stis", "ccdtab")
            .unwrap()
            .field_names()
            .collect();
        assert_eq!(fields, vec!["binaxis1", "binaxis2", "ccdamp", "ccdgain", "ccdoffst"]);
        assert_eq!(registry.len(), 32);
    }

    #[test]
    fn test_insert_overrides() {
        let mut registry = RuleRegistry::builtin();
        let rule = RuleSpec::new("Custom", [("detector", ComparisonSpec::default())]).unwrap();
        let replaced = registry.insert(TableKind::new("COS", "DISPTAB"), rule);
        assert_eq!(replaced.map(|r| r.name().to_string()), Some("COSDISPTAB".to_string()));
        assert_eq!(registry.lookup("cos", "disptab").unwrap().name(), "Custom");
    }

    #[test]
    fn test_builtin_with_wildcards() {
        let registry = RuleRegistry::builtin_with_wildcards(&["*".to_string()]).unwrap();
        assert_eq!(registry.len(), RuleRegistry::builtin().len());
        let rule = registry.lookup("stis", "ccdtab").unwrap();
        assert!(rule
            .mode_fields()
            .values()
            .all(|spec| spec.options.wildcards == vec!["*".to_string()]));
        assert!(registry.header_stub("cos", "LBYX01010").is_some());
    }

    #[test]
    fn test_header_stubs_are_separable() {
        let registry = RuleRegistry::builtin();
        assert!(registry.header_stub("COS", "LBYX01010:LBYX01Q7Q").is_some());
        assert!(registry.header_stub("stis", "LBYX01010").is_none());

        let registry = registry.without_header_stubs();
        assert!(registry.header_stub("cos", "LBYX01010").is_none());
        assert!(registry.lookup("cos", "disptab").is_ok());
    }
}
