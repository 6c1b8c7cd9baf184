//! External term dictionary: pre-existing definitions consulted on demand
//!
//! The dictionary is a black box to the vocabulary pass: given an IRI it
//! returns a definition or nothing. Two implementations:
//! - `JsonLdDictionary`: indexed from a JSON-LD `@graph` document (e.g. the
//!   schema.org release file)
//! - `EmptyDictionary`: knows nothing; used when no dictionary is configured

use super::term::VocabularyTerm;
use crate::graph::ContextMapping;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from loading a dictionary document
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document has no @graph array: {0}")]
    MissingGraph(String),
}

/// Result type for dictionary operations
pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Lookup contract for pre-existing term definitions.
pub trait TermDictionary: Send + Sync {
    /// Definition for an absolute IRI, if known
    fn lookup(&self, id: &str) -> Option<VocabularyTerm>;

    /// `(label, IRI)` pairs used to seed name resolution
    fn labels(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// A dictionary that knows no terms
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDictionary;

impl TermDictionary for EmptyDictionary {
    fn lookup(&self, _id: &str) -> Option<VocabularyTerm> {
        None
    }
}

/// CURIE prefixes and their absolute forms
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixMap {
    prefixes: Vec<(String, String)>,
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self::new()
            .with_prefix("schema", "http://schema.org/")
            .with_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#")
            .with_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
    }
}

impl PrefixMap {
    pub fn new() -> Self {
        Self { prefixes: Vec::new() }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), iri.into()));
        self
    }

    /// Rewrite a `prefix:local` shorthand to its absolute form.
    ///
    /// Anything without a known prefix is returned unchanged.
    pub fn expand(&self, id: &str) -> String {
        if let Some((prefix, local)) = id.split_once(':') {
            if let Some((_, iri)) = self.prefixes.iter().find(|(p, _)| p == prefix) {
                return format!("{}{}", iri, local);
            }
        }
        id.to_string()
    }

    /// Whether `id` starts with a known prefix
    pub fn is_shorthand(&self, id: &str) -> bool {
        id.split_once(':')
            .map(|(prefix, _)| self.prefixes.iter().any(|(p, _)| p == prefix))
            .unwrap_or(false)
    }
}

/// Dictionary backed by the `@graph` of a JSON-LD document
#[derive(Debug, Clone, Default)]
pub struct JsonLdDictionary {
    terms: HashMap<String, VocabularyTerm>,
    order: Vec<String>,
}

impl JsonLdDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-parsed terms
    pub fn from_terms(terms: impl IntoIterator<Item = VocabularyTerm>) -> Self {
        let mut dictionary = Self::new();
        for term in terms {
            dictionary.insert(term);
        }
        dictionary
    }

    /// Index every class and property node of a JSON-LD document.
    ///
    /// Term ids are expanded through `prefixes`. Nodes that are neither
    /// classes nor properties are skipped.
    pub fn from_document(document: &Value, prefixes: &PrefixMap) -> Option<Self> {
        let graph = document.get("@graph")?.as_array()?;
        let mut dictionary = Self::new();
        for node in graph {
            if let Some(mut term) = VocabularyTerm::from_jsonld(node) {
                term.id = prefixes.expand(&term.id);
                dictionary.insert(term);
            }
        }
        Some(dictionary)
    }

    /// Read and index a JSON-LD dictionary file
    pub async fn load(path: &Path, prefixes: &PrefixMap) -> DictionaryResult<Self> {
        let document = read_document(path).await?;
        let dictionary = Self::from_document(&document, prefixes)
            .ok_or_else(|| DictionaryError::MissingGraph(path.display().to_string()))?;
        tracing::info!(path = %path.display(), terms = dictionary.len(), "loaded term dictionary");
        Ok(dictionary)
    }

    /// Add or replace a definition
    pub fn insert(&mut self, term: VocabularyTerm) {
        if !self.terms.contains_key(&term.id) {
            self.order.push(term.id.clone());
        }
        self.terms.insert(term.id.clone(), term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TermDictionary for JsonLdDictionary {
    fn lookup(&self, id: &str) -> Option<VocabularyTerm> {
        self.terms.get(id).cloned()
    }

    fn labels(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|id| self.terms.get(id))
            .map(|t| (t.label.clone(), t.id.clone()))
            .collect()
    }
}

/// Fix-ups applied to extension terms before they are merged
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionOptions {
    /// Substring rewrites applied to term ids, in order
    pub id_rewrites: Vec<(String, String)>,
    /// Exact label replacements
    pub label_renames: Vec<(String, String)>,
}

impl Default for ExtensionOptions {
    fn default() -> Self {
        Self {
            id_rewrites: vec![
                ("#object".into(), "#Object".into()),
                ("http://pcdm.org/models".into(), "http://pcdm.org/2016/04/18/models".into()),
            ],
            label_renames: vec![("Object".into(), "RepositoryObject".into())],
        }
    }
}

/// Extension terms accepted from a document, and the ids that were not
#[derive(Debug, Clone, Default)]
pub struct ExtensionTerms {
    pub terms: Vec<VocabularyTerm>,
    pub rejected: Vec<String>,
}

impl ExtensionTerms {
    /// Resolve each class/property node of `document` to an absolute IRI.
    ///
    /// An id that is neither absolute, a known CURIE, nor a name in
    /// `context` is rejected and reported.
    pub fn from_document(
        document: &Value,
        prefixes: &PrefixMap,
        context: &ContextMapping,
        options: &ExtensionOptions,
    ) -> Option<Self> {
        let graph = document.get("@graph")?.as_array()?;
        let mut accepted = Self::default();
        for node in graph {
            let Some(mut term) = VocabularyTerm::from_jsonld(node) else {
                continue;
            };
            let Some(mut id) = resolve_extension_id(&term.id, prefixes, context) else {
                tracing::warn!(term = %term.id, "can't add extension term: id does not resolve");
                accepted.rejected.push(term.id);
                continue;
            };
            for (from, to) in &options.id_rewrites {
                id = id.replace(from.as_str(), to);
            }
            term.id = id;
            if let Some((_, to)) = options.label_renames.iter().find(|(from, _)| *from == term.label) {
                term.label = to.clone();
            }
            accepted.terms.push(term);
        }
        Some(accepted)
    }

    /// Read an extension term document
    pub async fn load(
        path: &Path,
        prefixes: &PrefixMap,
        context: &ContextMapping,
        options: &ExtensionOptions,
    ) -> DictionaryResult<Self> {
        let document = read_document(path).await?;
        let loaded = Self::from_document(&document, prefixes, context, options)
            .ok_or_else(|| DictionaryError::MissingGraph(path.display().to_string()))?;
        tracing::info!(
            path = %path.display(),
            accepted = loaded.terms.len(),
            rejected = loaded.rejected.len(),
            "loaded extension terms"
        );
        Ok(loaded)
    }
}

fn resolve_extension_id(id: &str, prefixes: &PrefixMap, context: &ContextMapping) -> Option<String> {
    if id.contains("://") {
        Some(id.to_string())
    } else if prefixes.is_shorthand(id) {
        Some(prefixes.expand(id))
    } else {
        context.resolve(id).map(str::to_string)
    }
}

async fn read_document(path: &Path) -> DictionaryResult<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| DictionaryError::Parse {
        path: path.display().to_string(),
        source,
    })
}
