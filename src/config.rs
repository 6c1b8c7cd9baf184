//! Run configuration: a YAML file plus command-line overrides

use crate::link::RELATIONSHIP_MARKER;
use crate::output::DEFAULT_BASE_CONTEXT;
use crate::source::InputSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up under the platform config directory
pub const CONFIG_FILE_NAME: &str = "graphlink.yaml";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything a run needs to know.
///
/// Unset fields in the YAML file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for the graph document; stdout when unset
    pub output_path: Option<PathBuf>,
    /// Directory for the vocabulary document
    pub vocab_path: Option<PathBuf>,
    /// Namespace IRI for minted terms
    pub namespace: Option<String>,
    /// JSON-LD dictionary of standard terms
    pub dictionary: Option<PathBuf>,
    /// JSON-LD file of additional terms
    pub extension_terms: Option<PathBuf>,
    pub inputs: Vec<InputSpec>,
    /// Extra short name -> IRI entries
    pub context: BTreeMap<String, String>,
    pub base_context: String,
    pub relationship_marker: String,
    pub label_renames: BTreeMap<String, String>,
    /// Fixed publication date; the run date when unset
    pub date_published: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: None,
            vocab_path: None,
            namespace: None,
            dictionary: None,
            extension_terms: None,
            inputs: Vec::new(),
            context: BTreeMap::new(),
            base_context: DEFAULT_BASE_CONTEXT.to_string(),
            relationship_marker: RELATIONSHIP_MARKER.to_string(),
            label_renames: [("MediaObject".to_string(), "File".to_string())]
                .into_iter()
                .collect(),
            date_published: None,
        }
    }
}

/// Values given on the command line; `Some` wins over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_path: Option<PathBuf>,
    pub vocab_path: Option<PathBuf>,
    pub namespace: Option<String>,
    pub dictionary: Option<PathBuf>,
    pub extension_terms: Option<PathBuf>,
    pub inputs: Vec<InputSpec>,
}

impl Config {
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The default config file location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("graphlink").join(CONFIG_FILE_NAME))
    }

    /// Load `explicit` if given, else the default file if it exists, else
    /// defaults
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line values. Inputs given on the command line replace
    /// the file's inputs.
    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.output_path.is_some() {
            self.output_path = overrides.output_path;
        }
        if overrides.vocab_path.is_some() {
            self.vocab_path = overrides.vocab_path;
        }
        if overrides.namespace.is_some() {
            self.namespace = overrides.namespace;
        }
        if overrides.dictionary.is_some() {
            self.dictionary = overrides.dictionary;
        }
        if overrides.extension_terms.is_some() {
            self.extension_terms = overrides.extension_terms;
        }
        if !overrides.inputs.is_empty() {
            self.inputs = overrides.inputs;
        }
    }

    /// Vocabulary inference runs only with both a namespace and somewhere to
    /// write the vocabulary
    pub fn vocabulary_enabled(&self) -> bool {
        self.namespace.is_some() && self.vocab_path.is_some()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_context.is_empty() {
            return Err(ConfigError::Invalid("base_context is empty".into()));
        }
        if self.relationship_marker.is_empty() {
            return Err(ConfigError::Invalid("relationship_marker is empty".into()));
        }
        if let Some(namespace) = &self.namespace {
            if namespace.trim_end_matches('#').is_empty() {
                return Err(ConfigError::Invalid("namespace is empty".into()));
            }
        }
        if let Some(date) = &self.date_published {
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                ConfigError::Invalid(format!("date_published '{}': {}", date, e))
            })?;
        }
        Ok(())
    }
}
