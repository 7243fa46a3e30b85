//! URL-encoded form parameters.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::FetchError;

/// An ordered set of URL-encoded form parameters.
///
/// Insertion order is preserved and [`set`](UrlEncodedParams::set) replaces
/// an existing value in place, mirroring `URLSearchParams` semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlEncodedParams {
    pairs: Vec<(String, String)>,
}

impl UrlEncodedParams {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Set a parameter, replacing any existing value for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some((_, v)) = self.pairs.iter_mut().find(|(n, _)| *n == name) {
            *v = value;
        } else {
            self.pairs.push((name, value));
        }
    }

    /// Get the value for a parameter name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Build parameters from a JSON object mapping.
    ///
    /// Composite values (objects, arrays) are flattened to their compact
    /// JSON text, `null` becomes an empty string, and scalars use their
    /// standard textual form. Only the top-level structure is handled.
    pub fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut params = Self::new();

        for (key, value) in map {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.set(key.clone(), text);
        }

        params
    }

    /// The percent-encoded wire form, e.g. `a=1&b=x`.
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for UrlEncodedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

/// Convert a key/value mapping into URL-encoded form parameters.
///
/// Accepts anything that serializes to a JSON object; any other shape
/// fails with [`FetchError::InvalidFormPayload`], and serialization
/// failures in the mapping itself propagate unchanged.
pub fn encode<T: Serialize>(mapping: &T) -> Result<UrlEncodedParams, FetchError> {
    match serde_json::to_value(mapping)? {
        Value::Object(map) => Ok(UrlEncodedParams::from_map(&map)),
        _ => Err(FetchError::InvalidFormPayload),
    }
}
