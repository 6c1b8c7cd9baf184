//! ContextMapping: short term names to canonical vocabulary IRIs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A JSON-LD style term table.
///
/// Shared by the entity graph and the vocabulary so a term used in one can
/// be traced to its definition in the other. Serializes as a plain object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextMapping {
    terms: BTreeMap<String, String>,
}

impl ContextMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a short name to its canonical IRI
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.terms.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.terms.contains_key(name)
    }

    /// Register a mapping, returning the previous IRI if one was replaced
    pub fn insert(&mut self, name: impl Into<String>, iri: impl Into<String>) -> Option<String> {
        self.terms.insert(name.into(), iri.into())
    }

    /// Register a mapping only if the name is unmapped
    pub fn insert_if_absent(&mut self, name: impl Into<String>, iri: impl Into<String>) -> bool {
        let name = name.into();
        if self.terms.contains_key(&name) {
            return false;
        }
        self.terms.insert(name, iri.into());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// As a JSON object suitable for an `@context` entry
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .terms
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContextMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ContextMapping {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.terms.insert(k.into(), v.into());
        }
    }
}
