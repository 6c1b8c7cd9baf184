//! Core graph data structures

mod context;
mod entity;
mod store;


pub use context::ContextMapping;
pub use entity::{is_metadata_key, Entity, EntityId, Properties, PropertyValue, RecordError};
pub use store::{EntityGraph, GraphError, GraphResult, ROOT_DATASET_ID, ROOT_DATASET_TYPE};
