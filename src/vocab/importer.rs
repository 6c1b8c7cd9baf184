//! Superclass import: pulls a class's ancestor chain in from the dictionary

use super::dictionary::{PrefixMap, TermDictionary};
use super::term::TermOrigin;
use super::vocabulary::Vocabulary;
use std::collections::{HashSet, VecDeque};

/// Fixed label replacements for imported classes that this domain
/// specializes (exact match).
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRenames {
    renames: Vec<(String, String)>,
}

impl Default for LabelRenames {
    fn default() -> Self {
        Self::new().with_rename("MediaObject", "File")
    }
}

impl LabelRenames {
    pub fn new() -> Self {
        Self { renames: Vec::new() }
    }

    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push((from.into(), to.into()));
        self
    }

    /// Replacement label, if `label` is in the table
    pub fn apply(&self, label: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(from, _)| from == label)
            .map(|(_, to)| to.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelRenames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            renames: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Imports dictionary classes and their ancestors into a [`Vocabulary`].
///
/// Works through a queue of class IRIs rather than recursing. Each IRI is
/// processed at most once per importer (`visited`), which also bounds the
/// walk on a cyclic dictionary.
pub struct SuperclassImporter<'a> {
    dictionary: &'a dyn TermDictionary,
    prefixes: &'a PrefixMap,
    renames: &'a LabelRenames,
    visited: HashSet<String>,
    imported: usize,
    unresolved: Vec<String>,
}

impl<'a> SuperclassImporter<'a> {
    pub fn new(dictionary: &'a dyn TermDictionary, prefixes: &'a PrefixMap, renames: &'a LabelRenames) -> Self {
        Self {
            dictionary,
            prefixes,
            renames,
            visited: HashSet::new(),
            imported: 0,
            unresolved: Vec::new(),
        }
    }

    /// Import the class `id` and its chain.
    ///
    /// Returns false, after reporting, when `id` is neither local nor in
    /// the dictionary.
    pub fn import(&mut self, vocab: &mut Vocabulary, id: &str) -> bool {
        if !vocab.contains(id) && !self.fetch(vocab, id) {
            return false;
        }
        self.import_chain(vocab, id);
        true
    }

    /// Walk `rdfs:subClassOf` links from `id`, rewriting shorthand to
    /// absolute IRIs and importing every ancestor the vocabulary lacks.
    ///
    /// Ancestors already present stop the walk on that branch; ancestors the
    /// dictionary does not know are reported and skipped. Returns the number
    /// of terms imported.
    pub fn import_chain(&mut self, vocab: &mut Vocabulary, id: &str) -> usize {
        let before = self.imported;
        let mut pending = VecDeque::from([id.to_string()]);

        while let Some(current) = pending.pop_front() {
            if !self.visited.insert(current.clone()) {
                continue;
            }
            let Some(term) = vocab.get_mut(&current) else {
                continue;
            };
            if term.origin == TermOrigin::Imported {
                if let Some(label) = self.renames.apply(&term.label) {
                    term.label = label.to_string();
                }
            }
            term.sub_class_of = term
                .sub_class_of
                .iter()
                .map(|s| self.prefixes.expand(s))
                .collect();
            let parents = term.sub_class_of.clone();

            for parent in parents {
                if vocab.contains(&parent) {
                    continue;
                }
                if self.fetch(vocab, &parent) {
                    pending.push_back(parent);
                }
            }
        }

        self.imported - before
    }

    /// Copy one definition from the dictionary into the vocabulary
    fn fetch(&mut self, vocab: &mut Vocabulary, id: &str) -> bool {
        match self.dictionary.lookup(id) {
            Some(mut term) => {
                term.id = id.to_string();
                term.origin = TermOrigin::Imported;
                tracing::debug!(term = %id, "importing dictionary term");
                vocab.insert(term);
                self.imported += 1;
                true
            }
            None => {
                if !self.unresolved.iter().any(|u| u == id) {
                    tracing::warn!(term = %id, "term not found in dictionary");
                    self.unresolved.push(id.to_string());
                }
                false
            }
        }
    }

    /// Number of terms copied from the dictionary so far
    pub fn imported_count(&self) -> usize {
        self.imported
    }

    /// IRIs the dictionary could not supply
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}
