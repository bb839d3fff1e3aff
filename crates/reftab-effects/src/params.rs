//! Per-dataset header/parameter values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping of parameter name to raw value, as supplied by a metadata source.
///
/// Values are kept raw; coercion happens when constraints are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DatasetParameters {
    values: BTreeMap<String, String>,
}

impl DatasetParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from a JSON object. Scalars are rendered to text,
    /// `null` becomes an empty string; nested values are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "dataset parameters must be a JSON object".to_string())?;
        let mut params = Self::new();
        for (key, value) in object {
            let raw = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(_) | serde_json::Value::Number(_) => value.to_string(),
                _ => return Err(format!("parameter '{key}' is not a scalar")),
            };
            params.insert(key.clone(), raw);
        }
        Ok(params)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy with every key lowercased. On a case-only key collision the
    /// lexicographically last original key wins.
    pub fn lowercased(&self) -> Self {
        self.values
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect()
    }

    /// Whether every field resolves case-insensitively.
    pub fn covers<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        let lower = self.lowercased();
        fields
            .into_iter()
            .all(|f| lower.get(&f.to_lowercase()).is_some())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DatasetParameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
