//! Record sources at the boundary with the extraction layer
//!
//! The extraction layer pages through a data store and emits flat JSON-LD
//! records in named groups. Linking only sees the `RecordSource` contract:
//! - `JsonFileSource`: reads each group from a JSON file
//! - `MemorySource`: yields preconstructed groups

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// A named batch of records.
///
/// `name` becomes the root dataset property listing the group's entities
/// (e.g. `archivalResources`).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub name: String,
    pub records: Vec<Value>,
}

impl RecordGroup {
    pub fn new(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// Errors establishing or reading the record stream
#[derive(Debug, Error)]
pub enum SourceError {
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

    #[error("{0} holds neither a record array nor an @graph")]
    InvalidDocument(String),
}

/// Result type for record sources
pub type SourceResult<T> = Result<T, SourceError>;

/// Streams record groups, one logical group at a time.
#[async_trait]
pub trait RecordSource: Send {
    /// The next group, or `None` once the source is exhausted
    async fn next_group(&mut self) -> SourceResult<Option<RecordGroup>>;
}

/// Where to read one group from: `group=path`, or just `path` to name the
/// group after the file stem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub group: Option<String>,
    pub path: PathBuf,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            group: None,
            path: path.into(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The explicit group name, else the file stem
    pub fn group_name(&self) -> String {
        self.group.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "records".to_string())
        })
    }
}

impl FromStr for InputSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((group, path)) if !group.is_empty() && !path.is_empty() => {
                Ok(Self::new(path).with_group(group))
            }
            Some(_) => Err(format!("expected group=path, got '{}'", s)),
            None if s.is_empty() => Err("empty input path".to_string()),
            None => Ok(Self::new(s)),
        }
    }
}

/// Reads one group per JSON file, in the order given
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    pending: VecDeque<InputSpec>,
}

impl JsonFileSource {
    pub fn new(inputs: impl IntoIterator<Item = InputSpec>) -> Self {
        Self {
            pending: inputs.into_iter().collect(),
        }
    }

    async fn read(path: &Path) -> SourceResult<Vec<Value>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| SourceError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        records_of(document).ok_or_else(|| SourceError::InvalidDocument(path.display().to_string()))
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn next_group(&mut self) -> SourceResult<Option<RecordGroup>> {
        let Some(input) = self.pending.pop_front() else {
            return Ok(None);
        };
        let records = Self::read(&input.path).await?;
        let name = input.group_name();
        tracing::debug!(group = %name, path = %input.path.display(), records = records.len(), "read record group");
        Ok(Some(RecordGroup::new(name, records)))
    }
}

/// A bare array of records, or a document with an `@graph` array
fn records_of(document: Value) -> Option<Vec<Value>> {
    match document {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove("@graph") {
            Some(Value::Array(records)) => Some(records),
            _ => None,
        },
        _ => None,
    }
}

/// Yields groups handed to it up front
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    groups: VecDeque<RecordGroup>,
}

impl MemorySource {
    pub fn new(groups: impl IntoIterator<Item = RecordGroup>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    pub fn with_group(mut self, group: RecordGroup) -> Self {
        self.groups.push_back(group);
        self
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn next_group(&mut self) -> SourceResult<Option<RecordGroup>> {
        Ok(self.groups.pop_front())
    }
}
