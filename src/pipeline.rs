//! The linking pipeline
//!
//! Stages run strictly in order, each over the complete output of the one
//! before:
//!
//! ```text
//! Extracted -> VocabularyExpanded (optional) -> RelationshipsLinked -> NamesRewritten -> Serialized
//! ```
//!
//! Records may only be ingested while the pipeline is `Extracted`. Calling a
//! stage out of order is a [`PipelineError::StageOrder`].

use crate::config::{Config, ConfigError};
use crate::graph::{ContextMapping, Entity, EntityGraph, ROOT_DATASET_ID, ROOT_DATASET_TYPE};
use crate::link::{LinkReport, NameIndex, RelationshipLinker, RewriteReport, RELATIONSHIP_MARKER};
use crate::output::{
    graph_document, vocabulary_document, DocumentSink, Documents, SinkError, DEFAULT_BASE_CONTEXT,
};
use crate::source::{RecordGroup, RecordSource, SourceError};
use crate::vocab::{
    DictionaryError, EmptyDictionary, ExtensionOptions, ExtensionTerms, JsonLdDictionary,
    LabelRenames, PrefixMap, TermDictionary, Vocabulary, VocabularyPass, VocabularyReport,
};
use thiserror::Error;

/// Context entry every vocabulary starts with
pub const REPOSITORY_OBJECT: (&str, &str) = ("RepositoryObject", "http://pcdm.org/2016/04/18/models#Object");

/// Where a pipeline is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Extracted,
    VocabularyExpanded,
    RelationshipsLinked,
    NamesRewritten,
    Serialized,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extracted => "extracted",
            Self::VocabularyExpanded => "vocabulary expanded",
            Self::RelationshipsLinked => "relationships linked",
            Self::NamesRewritten => "names rewritten",
            Self::Serialized => "serialized",
        };
        write!(f, "{}", name)
    }
}

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Record source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage out of order: expected {expected}, pipeline is {found}")]
    StageOrder { expected: Stage, found: Stage },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Settings that shape the output, independent of where records come from
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub base_context: String,
    pub relationship_marker: String,
    pub label_renames: LabelRenames,
    /// Entries appended to both documents' `@context`
    pub extra_context: ContextMapping,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_context: DEFAULT_BASE_CONTEXT.to_string(),
            relationship_marker: RELATIONSHIP_MARKER.to_string(),
            label_renames: LabelRenames::default(),
            extra_context: ContextMapping::new(),
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            base_context: config.base_context.clone(),
            relationship_marker: config.relationship_marker.clone(),
            label_renames: config.label_renames.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
            extra_context: config.context.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
        }
    }
}

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub groups: usize,
    pub records_ingested: usize,
    /// Records without a usable `@id` or `@type`
    pub records_skipped: usize,
    /// Records whose id was already in the graph
    pub duplicate_records: usize,
    /// `None` when vocabulary inference is disabled
    pub vocabulary: Option<VocabularyReport>,
    pub links: LinkReport,
    pub rewrite: RewriteReport,
}

/// One run over one entity graph.
pub struct Pipeline {
    graph: EntityGraph,
    vocabulary: Option<Vocabulary>,
    dictionary: Box<dyn TermDictionary>,
    prefixes: PrefixMap,
    options: PipelineOptions,
    stage: Stage,
    report: RunReport,
}

impl Pipeline {
    /// A pipeline with vocabulary inference disabled
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_graph(EntityGraph::new(), options)
    }

    /// Start from a graph that already holds its root dataset
    pub fn with_graph(graph: EntityGraph, options: PipelineOptions) -> Self {
        Self {
            graph,
            vocabulary: None,
            dictionary: Box::new(EmptyDictionary),
            prefixes: PrefixMap::default(),
            options,
            stage: Stage::Extracted,
            report: RunReport::default(),
        }
    }

    /// Enable vocabulary inference
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary, dictionary: impl TermDictionary + 'static) -> Self {
        self.vocabulary = Some(vocabulary);
        self.dictionary = Box::new(dictionary);
        self
    }

    /// Build a pipeline from configuration, loading the dictionary and
    /// extension terms it names
    pub async fn from_config(config: &Config) -> PipelineResult<Self> {
        config.validate()?;
        let options = PipelineOptions::from(config);
        let date = config
            .date_published
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        let root = Entity::new(ROOT_DATASET_ID, ROOT_DATASET_TYPE).with_text("datePublished", date);
        let pipeline = Self::with_graph(EntityGraph::with_root(root), options);

        let Some(namespace) = config.namespace.as_deref().filter(|_| config.vocabulary_enabled()) else {
            tracing::debug!("vocabulary inference disabled");
            return Ok(pipeline);
        };

        let prefixes = PrefixMap::default();
        let mut dictionary = match &config.dictionary {
            Some(path) => JsonLdDictionary::load(path, &prefixes).await?,
            None => JsonLdDictionary::new(),
        };

        let mut context: ContextMapping = config.context.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        context.insert_if_absent(REPOSITORY_OBJECT.0, REPOSITORY_OBJECT.1);
        let mut vocabulary = Vocabulary::new(namespace).with_context(context);
        let seeded = vocabulary.seed_context(&dictionary);
        tracing::debug!(labels = seeded, "seeded context from dictionary");

        if let Some(path) = &config.extension_terms {
            let extension =
                ExtensionTerms::load(path, &prefixes, vocabulary.context(), &ExtensionOptions::default()).await?;
            for term in &extension.terms {
                dictionary.insert(term.clone());
            }
            vocabulary.add_extension_terms(extension.terms);
        }

        Ok(pipeline.with_vocabulary(vocabulary, dictionary))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    fn expect_stage(&self, expected: Stage) -> PipelineResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(PipelineError::StageOrder {
                expected,
                found: self.stage,
            })
        }
    }

    /// Add one group of records and list them on the root dataset.
    ///
    /// Records without an `@id` or `@type` are skipped with a warning.
    /// Returns the number of records accepted.
    pub fn ingest_group(&mut self, group: RecordGroup) -> PipelineResult<usize> {
        self.expect_stage(Stage::Extracted)?;
        let mut members = Vec::with_capacity(group.records.len());
        for record in &group.records {
            let entity = match Entity::from_record(record) {
                Ok(entity) => entity,
                Err(e) => {
                    tracing::warn!(group = %group.name, error = %e, "skipping record");
                    self.report.records_skipped += 1;
                    continue;
                }
            };
            members.push(entity.id.clone());
            if !self.graph.add(entity) {
                self.report.duplicate_records += 1;
            }
        }

        let accepted = members.len();
        self.graph.add_group(&group.name, members);
        self.report.groups += 1;
        self.report.records_ingested += accepted;
        tracing::info!(group = %group.name, records = accepted, "ingested record group");
        Ok(accepted)
    }

    /// Drain a record source, group by group
    pub async fn ingest_from(&mut self, source: &mut dyn RecordSource) -> PipelineResult<usize> {
        let mut total = 0;
        while let Some(group) = source.next_group().await? {
            total += self.ingest_group(group)?;
        }
        Ok(total)
    }

    /// Define a term for every type and property in use.
    ///
    /// A no-op that leaves the stage at `Extracted` when inference is
    /// disabled.
    pub fn expand_vocabulary(&mut self) -> PipelineResult<Option<&VocabularyReport>> {
        self.expect_stage(Stage::Extracted)?;
        let Some(vocabulary) = self.vocabulary.as_mut() else {
            return Ok(None);
        };
        let report = VocabularyPass::new(
            vocabulary,
            self.dictionary.as_ref(),
            &self.prefixes,
            &self.options.label_renames,
            &self.options.relationship_marker,
        )
        .run(&mut self.graph);

        self.stage = Stage::VocabularyExpanded;
        self.report.vocabulary = Some(report);
        Ok(self.report.vocabulary.as_ref())
    }

    /// Back-reference and name every relationship entity
    pub fn link_relationships(&mut self) -> PipelineResult<&LinkReport> {
        let expected = if self.vocabulary.is_some() {
            Stage::VocabularyExpanded
        } else {
            Stage::Extracted
        };
        self.expect_stage(expected)?;
        self.report.links = RelationshipLinker::new(self.options.relationship_marker.as_str()).link(&mut self.graph);
        self.stage = Stage::RelationshipsLinked;
        Ok(&self.report.links)
    }

    /// Turn text values that name an entity into references
    pub fn rewrite_names(&mut self) -> PipelineResult<&RewriteReport> {
        self.expect_stage(Stage::RelationshipsLinked)?;
        self.report.rewrite = NameIndex::build(&self.graph).rewrite(&mut self.graph);
        self.stage = Stage::NamesRewritten;
        Ok(&self.report.rewrite)
    }

    /// Assemble the output documents from the current state
    pub fn documents(&self) -> Documents {
        let mut extra = self.options.extra_context.clone();
        if let Some(vocabulary) = &self.vocabulary {
            extra.extend(vocabulary.added_context().iter());
        }
        Documents {
            graph: graph_document(&self.graph, &self.options.base_context, &extra),
            vocabulary: self
                .vocabulary
                .as_ref()
                .map(|v| vocabulary_document(v, &self.options.base_context, &extra)),
        }
    }

    /// Hand the documents to `sink`
    pub async fn serialize(&mut self, sink: &dyn DocumentSink) -> PipelineResult<Documents> {
        self.expect_stage(Stage::NamesRewritten)?;
        let documents = self.documents();
        sink.write_graph(&documents.graph).await?;
        if let Some(vocabulary) = &documents.vocabulary {
            sink.write_vocabulary(vocabulary).await?;
        }
        self.stage = Stage::Serialized;
        Ok(documents)
    }

    /// Run every stage in order
    pub async fn run(mut self, source: &mut dyn RecordSource, sink: &dyn DocumentSink) -> PipelineResult<RunReport> {
        self.ingest_from(source).await?;
        self.expand_vocabulary()?;
        self.link_relationships()?;
        self.rewrite_names()?;
        self.serialize(sink).await?;
        tracing::info!(
            entities = self.graph.len(),
            skipped = self.report.records_skipped,
            dangling = self.report.links.dangling.len(),
            "run complete"
        );
        Ok(self.report)
    }
}
