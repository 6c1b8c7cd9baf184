//! Common helpers for graphlink integration tests
//!
//! Record fixtures shaped like the extraction layer's output, and lookups
//! into serialized documents.

#![allow(dead_code)]

pub mod documents;
pub mod records;

#[allow(unused_imports)]
pub use documents::{node, nodes, strip_vocabulary_decoration};
#[allow(unused_imports)]
pub use records::{archival_group, creator_group, dictionary_fixture, NAMESPACE};
