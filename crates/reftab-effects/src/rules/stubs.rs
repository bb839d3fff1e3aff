//! Transitional dataset header stubs.
//!
//! Until the metadata source returns the row-selection parameters for every
//! dataset, some instruments carry a small table of known datasets and the
//! header values to use for them. Stubs are only consulted when the supplied
//! parameters cannot satisfy a rule; drop them once metadata is complete.

use crate::params::DatasetParameters;
use std::collections::BTreeMap;

/// Dataset id (uppercase, without member suffix) to substitute parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderStubs {
    datasets: BTreeMap<String, DatasetParameters>,
}

impl HeaderStubs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset_id: &str, headers: DatasetParameters) {
        self.datasets.insert(dataset_key(dataset_id), headers);
    }

    /// Look up a dataset, accepting `<assoc>:<member>` ids.
    pub fn get(&self, dataset: &str) -> Option<&DatasetParameters> {
        self.datasets.get(&dataset_key(dataset))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// The COS stub table used while COS row-selection keywords are missing
    /// from the metadata source.
    pub fn cos_transitional() -> Self {
        let entries: [(&str, &[(&str, &str)]); 6] = [
            (
                "LA7803FKQ",
                &[("opt_elem", "G160M"), ("cenwave", "1600"), ("aperture", "WCA"), ("segment", "BOTH")],
            ),
            (
                "LBYX01010",
                &[("opt_elem", "G140L"), ("cenwave", "1280"), ("aperture", "PSA"), ("segment", "FUVB")],
            ),
            (
                "LB4P02050",
                &[("opt_elem", "G160M"), ("cenwave", "1600"), ("aperture", "PSA")],
            ),
            (
                "LB4P07010",
                &[("opt_elem", "G140L"), ("cenwave", "1230"), ("aperture", "PSA")],
            ),
            (
                "LB6M01030",
                &[("opt_elem", "G230L"), ("cenwave", "3000"), ("aperture", "PSA")],
            ),
            (
                "LBK617010",
                &[("opt_elem", "G185M"), ("cenwave", "1986"), ("aperture", "PSA")],
            ),
        ];

        let mut stubs = Self::new();
        for (dataset, headers) in entries {
            stubs.insert(dataset, headers.iter().copied().collect());
        }
        stubs
    }
}

fn dataset_key(dataset: &str) -> String {
    dataset
        .split(':')
        .next()
        .unwrap_or(dataset)
        .trim()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_strips_member() {
        let stubs = HeaderStubs::cos_transitional();
        let headers = stubs.get("lbyx01010:lbyx01q7q").unwrap();
        assert_eq!(headers.get("segment"), Some("FUVB"));
        assert_eq!(headers.get("cenwave"), Some("1280"));
        assert!(stubs.get("LBYX99999").is_none());
    }

    #[test]
    fn test_cos_table_size() {
        assert_eq!(HeaderStubs::cos_transitional().len(), 6);
        assert!(HeaderStubs::new().is_empty());
    }
}
