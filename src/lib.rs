//! Graphlink: links flat typed records into a JSON-LD entity graph
//!
//! Records arrive in named groups from an extraction layer. Graphlink
//! collects them into one graph, optionally grows a vocabulary describing
//! every type and property they use, and then links the graph:
//!
//! - **Relationships**: entities typed with the relationship marker get
//!   back-references on their endpoints and a readable name
//! - **Names**: text values that exactly match another entity's name become
//!   references to it
//!
//! # Example
//!
//! ```
//! use graphlink::{Entity, EntityGraph, NameIndex, RelationshipLinker};
//!
//! let mut graph = EntityGraph::new();
//! graph.add(Entity::new("#jane", "Person").with_text("name", "Jane Doe"));
//! graph.add(Entity::new("#letters", "CreativeWork").with_text("author", "Jane Doe"));
//!
//! RelationshipLinker::default().link(&mut graph);
//! let report = NameIndex::build(&graph).rewrite(&mut graph);
//! assert_eq!(report.values_rewritten, 1);
//! ```

pub mod config;
mod graph;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod vocab;

pub use config::{Config, ConfigError, Overrides};
pub use graph::{
    ContextMapping, Entity, EntityGraph, EntityId, GraphError, GraphResult, Properties,
    PropertyValue, RecordError, ROOT_DATASET_ID, ROOT_DATASET_TYPE,
};
pub use link::{LinkReport, NameIndex, RelationshipLinker, RewriteReport};
pub use output::{DocumentSink, Documents, FileSink, MemorySink, SinkError};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineResult, RunReport, Stage};
pub use source::{InputSpec, JsonFileSource, MemorySource, RecordGroup, RecordSource, SourceError};
pub use vocab::{JsonLdDictionary, TermDictionary, Vocabulary, VocabularyReport, VocabularyTerm};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
