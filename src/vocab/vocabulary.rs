//! Vocabulary: the local term store, name resolution, and minting

use super::dictionary::TermDictionary;
use super::term::{TermKind, TermOrigin, VocabularyTerm};
use crate::graph::ContextMapping;
use std::collections::HashMap;

/// The vocabulary grown alongside an entity graph.
///
/// Terms are keyed by IRI. Names resolve through the shared
/// [`ContextMapping`]; names that do not resolve are minted as
/// `{namespace}#{name}`. Every term created here is recorded as a pending
/// mention for the root dataset and its mapping is tracked separately so it
/// can be appended to the output documents' `@context`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    namespace: String,
    terms: Vec<VocabularyTerm>,
    index: HashMap<String, usize>,
    context: ContextMapping,
    added_context: ContextMapping,
    mentions: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary minting into `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        Self {
            namespace: namespace.trim_end_matches('#').to_string(),
            terms: Vec::new(),
            index: HashMap::new(),
            context: ContextMapping::new(),
            added_context: ContextMapping::new(),
            mentions: Vec::new(),
        }
    }

    /// Start from an existing context mapping
    pub fn with_context(mut self, context: ContextMapping) -> Self {
        self.context = context;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The full resolution context
    pub fn context(&self) -> &ContextMapping {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextMapping {
        &mut self.context
    }

    /// Mappings registered for terms created by this vocabulary
    pub fn added_context(&self) -> &ContextMapping {
        &self.added_context
    }

    /// Resolve a short name to its canonical IRI
    pub fn resolve_term(&self, name: &str) -> Option<&str> {
        self.context.resolve(name)
    }

    pub fn get(&self, id: &str) -> Option<&VocabularyTerm> {
        self.index.get(id).map(|&i| &self.terms[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut VocabularyTerm> {
        self.index.get(id).map(|&i| &mut self.terms[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a term; a no-op when its IRI is already present
    pub fn insert(&mut self, term: VocabularyTerm) -> bool {
        if self.index.contains_key(&term.id) {
            return false;
        }
        self.index.insert(term.id.clone(), self.terms.len());
        self.terms.push(term);
        true
    }

    /// The IRI a minted term for `name` receives
    pub fn minted_id(&self, name: &str) -> String {
        format!("{}#{}", self.namespace, name)
    }

    /// Mint a class for an unknown type name and return its IRI
    pub fn mint_class(&mut self, name: &str) -> String {
        let term = VocabularyTerm::class(self.minted_id(name), name);
        self.register(name, term)
    }

    /// Mint a property (empty domain and range) and return its IRI
    pub fn mint_property(&mut self, name: &str) -> String {
        let term = VocabularyTerm::property(self.minted_id(name), name);
        self.register(name, term)
    }

    /// Define a term under an IRI the context already resolves `name` to
    pub fn define_local(&mut self, id: &str, name: &str, kind: TermKind) -> String {
        let term = match kind {
            TermKind::Class => VocabularyTerm::class(id, name),
            TermKind::Property => VocabularyTerm::property(id, name),
        }
        .with_origin(TermOrigin::Local);
        self.register(name, term)
    }

    fn register(&mut self, name: &str, term: VocabularyTerm) -> String {
        let id = term.id.clone();
        tracing::debug!(term = %id, kind = ?term.kind, "defining vocabulary term");
        if self.insert(term) {
            self.mentions.push(id.clone());
        }
        self.context.insert(name, id.clone());
        self.added_context.insert(name, id.clone());
        id
    }

    /// Drain the IRIs of terms created since the last call
    pub fn take_mentions(&mut self) -> Vec<String> {
        std::mem::take(&mut self.mentions)
    }

    /// Map every dictionary label not already in the context to its IRI
    pub fn seed_context(&mut self, dictionary: &dyn TermDictionary) -> usize {
        dictionary
            .labels()
            .into_iter()
            .filter(|(label, id)| self.context.insert_if_absent(label.clone(), id.clone()))
            .count()
    }

    /// Load predefined terms, mapping their labels into the context
    pub fn add_extension_terms(&mut self, terms: impl IntoIterator<Item = VocabularyTerm>) -> usize {
        let mut added = 0;
        for term in terms {
            let (label, id) = (term.label.clone(), term.id.clone());
            if self.insert(term.with_origin(TermOrigin::Extension)) {
                self.context.insert_if_absent(label, id);
                added += 1;
            }
        }
        added
    }

    /// All terms, in insertion order
    pub fn terms(&self) -> impl Iterator<Item = &VocabularyTerm> {
        self.terms.iter()
    }

    pub fn classes(&self) -> impl Iterator<Item = &VocabularyTerm> {
        self.terms.iter().filter(|t| t.is_class())
    }

    pub fn properties(&self) -> impl Iterator<Item = &VocabularyTerm> {
        self.terms.iter().filter(|t| t.is_property())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
