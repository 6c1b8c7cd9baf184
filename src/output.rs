//! Output documents and the sinks that receive them
//!
//! Both documents share one envelope: `@context` is the base context URL
//! followed by the extra term mappings, and `@graph` opens with the metadata
//! descriptor and the root dataset.

use crate::graph::{ContextMapping, EntityGraph, ROOT_DATASET_ID, ROOT_DATASET_TYPE};
use crate::vocab::Vocabulary;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Default `@context` for both documents
pub const DEFAULT_BASE_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";

/// Profile the metadata descriptor conforms to
pub const PROFILE: &str = "https://w3id.org/ro/crate/1.1";

/// File name of the metadata descriptor and of every written document
pub const METADATA_FILE_NAME: &str = "ro-crate-metadata.json";

/// The documents produced by a run
#[derive(Debug, Clone, PartialEq)]
pub struct Documents {
    pub graph: Value,
    pub vocabulary: Option<Value>,
}

/// The entity graph as a JSON-LD document
pub fn graph_document(graph: &EntityGraph, base_context: &str, extra: &ContextMapping) -> Value {
    let mut nodes = vec![descriptor()];
    nodes.extend(graph.entities().map(|e| serde_json::to_value(e).unwrap_or(Value::Null)));
    envelope(base_context, extra, nodes)
}

/// The vocabulary as a JSON-LD document
pub fn vocabulary_document(vocab: &Vocabulary, base_context: &str, extra: &ContextMapping) -> Value {
    let mut nodes = vec![
        descriptor(),
        json!({"@id": ROOT_DATASET_ID, "@type": [ROOT_DATASET_TYPE]}),
    ];
    nodes.extend(vocab.terms().map(|t| t.to_jsonld()));
    envelope(base_context, extra, nodes)
}

fn descriptor() -> Value {
    json!({
        "@id": METADATA_FILE_NAME,
        "@type": "CreativeWork",
        "conformsTo": {"@id": PROFILE},
        "about": {"@id": ROOT_DATASET_ID}
    })
}

fn envelope(base_context: &str, extra: &ContextMapping, nodes: Vec<Value>) -> Value {
    json!({"@context": [base_context, extra.to_json()], "@graph": nodes})
}

/// Pretty-print with four-space indentation
pub fn to_pretty_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Errors writing documents
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No destination configured for the vocabulary document")]
    NoVocabularyDestination,
}

/// Result type for sinks
pub type SinkResult<T> = Result<T, SinkError>;

/// Receives the finished documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn write_graph(&self, document: &Value) -> SinkResult<()>;

    async fn write_vocabulary(&self, document: &Value) -> SinkResult<()>;
}

/// Writes `ro-crate-metadata.json` into the configured directories.
///
/// Without an output directory the graph is printed to stdout.
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    output_path: Option<PathBuf>,
    vocab_path: Option<PathBuf>,
}

impl FileSink {
    pub fn new(output_path: Option<PathBuf>, vocab_path: Option<PathBuf>) -> Self {
        Self {
            output_path,
            vocab_path,
        }
    }

    async fn write_into(dir: &Path, document: &Value) -> SinkResult<PathBuf> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |source| SinkError::Io { path, source }
        };
        tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;
        let file = dir.join(METADATA_FILE_NAME);
        let text = to_pretty_json(document)?;
        tokio::fs::write(&file, text).await.map_err(io_err(&file))?;
        tracing::info!(path = %file.display(), "wrote document");
        Ok(file)
    }
}

#[async_trait]
impl DocumentSink for FileSink {
    async fn write_graph(&self, document: &Value) -> SinkResult<()> {
        match &self.output_path {
            Some(dir) => Self::write_into(dir, document).await.map(|_| ()),
            None => {
                println!("{}", to_pretty_json(document)?);
                Ok(())
            }
        }
    }

    async fn write_vocabulary(&self, document: &Value) -> SinkResult<()> {
        let dir = self.vocab_path.as_ref().ok_or(SinkError::NoVocabularyDestination)?;
        Self::write_into(dir, document).await.map(|_| ())
    }
}

/// Keeps documents in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    graph: Mutex<Option<Value>>,
    vocabulary: Mutex<Option<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> Option<Value> {
        self.graph.lock().ok().and_then(|g| g.clone())
    }

    pub fn vocabulary(&self) -> Option<Value> {
        self.vocabulary.lock().ok().and_then(|v| v.clone())
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write_graph(&self, document: &Value) -> SinkResult<()> {
        if let Ok(mut slot) = self.graph.lock() {
            *slot = Some(document.clone());
        }
        Ok(())
    }

    async fn write_vocabulary(&self, document: &Value) -> SinkResult<()> {
        if let Ok(mut slot) = self.vocabulary.lock() {
            *slot = Some(document.clone());
        }
        Ok(())
    }
}
