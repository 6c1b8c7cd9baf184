//! Vocabulary inference: terms, resolution, dictionary import, domain/range

mod accumulator;
mod dictionary;
mod importer;
mod term;
mod vocabulary;

pub use accumulator::{RangeObservations, VocabularyPass, VocabularyReport};
pub use dictionary::{
    DictionaryError, DictionaryResult, EmptyDictionary, ExtensionOptions, ExtensionTerms,
    JsonLdDictionary, PrefixMap, TermDictionary,
};
pub use importer::{LabelRenames, SuperclassImporter};
pub use term::{local_name, TermKind, TermOrigin, VocabularyTerm, PLACEHOLDER_COMMENT};
pub use vocabulary::Vocabulary;
