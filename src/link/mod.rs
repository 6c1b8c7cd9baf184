//! Post-extraction linking passes

mod names;
mod relationship;

pub use names::{NameCollision, NameIndex, RewriteReport};
pub use relationship::{
    DanglingReference, Endpoint, LinkReport, RelationshipLinker, RELATIONSHIP_MARKER,
};
