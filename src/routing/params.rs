//! Path parameters bound by the matcher.

use std::collections::HashMap;
use std::ops::Index;

use serde::Serialize;

/// Variable bindings extracted from a request path.
///
/// Owned per request and populated fresh on each successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Parameters(HashMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Missing names index to the empty string.
impl Index<&str> for Parameters {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut params = Parameters::new();
        assert!(params.is_empty());
        params.set("id", "42");
        params.set("id", "43");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("43"));
        assert_eq!(&params["id"], "43");
        assert_eq!(&params["missing"], "");
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_serializes_as_map() {
        let params: Parameters = [("id", "7")].into_iter().collect();
        assert_eq!(serde_json::to_value(&params).unwrap(), serde_json::json!({"id": "7"}));
    }
}
