//! Vocabulary pass: resolves or mints a term for every type and property in
//! use, and accumulates property domains and ranges.

use super::dictionary::{PrefixMap, TermDictionary};
use super::importer::{LabelRenames, SuperclassImporter};
use super::term::{TermKind, TermOrigin};
use super::vocabulary::Vocabulary;
use crate::graph::{Entity, EntityGraph, EntityId, PropertyValue};
use std::collections::{BTreeMap, BTreeSet};

/// Range types observed per property during the entity pass.
///
/// Flushed into `rangeIncludes` once every entity has been visited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeObservations {
    by_property: BTreeMap<String, BTreeSet<String>>,
}

impl RangeObservations {
    pub fn observe(&mut self, property: &str, class: impl Into<String>) {
        self.by_property
            .entry(property.to_string())
            .or_default()
            .insert(class.into());
    }

    pub fn get(&self, property: &str) -> Option<&BTreeSet<String>> {
        self.by_property.get(property)
    }

    /// Number of properties with at least one observation
    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }

    /// Union each property's observations into its `rangeIncludes`.
    /// Returns the number of properties updated.
    pub fn flush_into(self, vocab: &mut Vocabulary) -> usize {
        let mut updated = 0;
        for (property, classes) in self.by_property {
            if let Some(term) = vocab.get_mut(&property) {
                term.union_range(classes);
                updated += 1;
            }
        }
        updated
    }
}

/// Summary of a vocabulary pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyReport {
    pub entities_visited: usize,
    pub classes_minted: usize,
    pub properties_minted: usize,
    /// Terms defined locally under an IRI the context already knew
    pub local_definitions: usize,
    pub terms_imported: usize,
    pub ranges_flushed: usize,
    /// Dictionary IRIs that could not be imported
    pub unresolved: Vec<String>,
}

/// One pass over an entity graph that grows a [`Vocabulary`].
pub struct VocabularyPass<'a> {
    vocab: &'a mut Vocabulary,
    importer: SuperclassImporter<'a>,
    marker: &'a str,
    relationship_root: Option<String>,
    report: VocabularyReport,
}

impl<'a> VocabularyPass<'a> {
    pub fn new(
        vocab: &'a mut Vocabulary,
        dictionary: &'a dyn TermDictionary,
        prefixes: &'a PrefixMap,
        renames: &'a LabelRenames,
        marker: &'a str,
    ) -> Self {
        Self {
            vocab,
            importer: SuperclassImporter::new(dictionary, prefixes, renames),
            marker,
            relationship_root: None,
            report: VocabularyReport::default(),
        }
    }

    /// Visit every entity (the root dataset last, so terms it mentions are
    /// themselves defined), then flush observed ranges.
    ///
    /// New terms are recorded as `mentions` on the root dataset.
    pub fn run(mut self, graph: &mut EntityGraph) -> VocabularyReport {
        let root = graph.root_id().clone();
        let mut order: Vec<EntityId> = graph.ids().into_iter().filter(|id| *id != root).collect();
        order.push(root);

        let mut ranges = RangeObservations::default();
        for id in &order {
            ranges = self.visit(graph, id, ranges);
            self.record_mentions(graph);
        }

        self.report.ranges_flushed = ranges.flush_into(self.vocab);
        self.report.terms_imported = self.importer.imported_count();
        self.report.unresolved = self.importer.unresolved().to_vec();

        tracing::info!(
            entities = self.report.entities_visited,
            classes_minted = self.report.classes_minted,
            properties_minted = self.report.properties_minted,
            imported = self.report.terms_imported,
            unresolved = self.report.unresolved.len(),
            "vocabulary pass complete"
        );
        self.report
    }

    fn visit(&mut self, graph: &EntityGraph, id: &EntityId, mut ranges: RangeObservations) -> RangeObservations {
        let Some(entity) = graph.get(id) else {
            return ranges;
        };
        self.report.entities_visited += 1;

        let relationship = entity.has_type(self.marker);
        let type_ids = self.class_ids(entity, relationship);

        for key in entity.data_keys() {
            let property = self.ensure_property(key);
            self.extend_domain(&property, &type_ids);
            for value in entity.values(key) {
                for type_name in value_types(graph, value) {
                    let class = self.ensure_class(type_name, false);
                    ranges.observe(&property, class);
                }
            }
        }

        if relationship {
            ranges = self.declare_link_properties(graph, entity, &type_ids, ranges);
        }
        ranges
    }

    /// Define `sourceOf`/`targetOf` on the endpoints' types and `name` on
    /// the relationship's types ahead of the linker adding them.
    fn declare_link_properties(
        &mut self,
        graph: &EntityGraph,
        relationship: &Entity,
        type_ids: &[String],
        mut ranges: RangeObservations,
    ) -> RangeObservations {
        for (endpoint_key, back_reference) in [("source", "sourceOf"), ("target", "targetOf")] {
            let endpoint = relationship
                .first(endpoint_key)
                .and_then(PropertyValue::as_entity_id)
                .and_then(|id| graph.get(&id));
            let Some(endpoint) = endpoint else {
                continue;
            };
            let property = self.ensure_property(back_reference);
            let endpoint_types = self.class_ids(endpoint, endpoint.has_type(self.marker));
            self.extend_domain(&property, &endpoint_types);
            for class in type_ids {
                ranges.observe(&property, class.clone());
            }
        }
        let name = self.ensure_property("name");
        self.extend_domain(&name, type_ids);
        ranges
    }

    fn class_ids(&mut self, entity: &Entity, relationship: bool) -> Vec<String> {
        entity
            .types
            .iter()
            .map(|t| self.ensure_class(t, relationship))
            .collect()
    }

    fn extend_domain(&mut self, property: &str, type_ids: &[String]) {
        if let Some(term) = self.vocab.get_mut(property).filter(|t| t.is_property()) {
            term.union_domain(type_ids.iter().cloned());
        }
    }

    /// Resolve, import, or mint the class for a type name and return its IRI.
    ///
    /// Classes of relationship-typed entities that are defined locally are
    /// made subclasses of the relationship root class.
    fn ensure_class(&mut self, name: &str, relationship: bool) -> String {
        let id = match self.vocab.resolve_term(name).map(str::to_owned) {
            Some(id) => {
                if self.vocab.contains(&id) {
                    self.importer.import_chain(self.vocab, &id);
                } else if !self.importer.import(self.vocab, &id) {
                    self.vocab.define_local(&id, name, TermKind::Class);
                    self.report.local_definitions += 1;
                }
                id
            }
            None => {
                self.report.classes_minted += 1;
                self.vocab.mint_class(name)
            }
        };

        if relationship && name != self.marker {
            let root = self.relationship_root();
            if let Some(term) = self.vocab.get_mut(&id) {
                if term.is_class() && matches!(term.origin, TermOrigin::Minted | TermOrigin::Local) {
                    term.add_superclass(root);
                }
            }
        }
        id
    }

    fn relationship_root(&mut self) -> String {
        if let Some(root) = &self.relationship_root {
            return root.clone();
        }
        let marker = self.marker;
        let root = self.ensure_class(marker, false);
        self.relationship_root = Some(root.clone());
        root
    }

    /// Resolve or mint the property for a key and return its IRI
    fn ensure_property(&mut self, name: &str) -> String {
        match self.vocab.resolve_term(name).map(str::to_owned) {
            Some(id) => {
                if !self.vocab.contains(&id) {
                    self.vocab.define_local(&id, name, TermKind::Property);
                    self.report.local_definitions += 1;
                }
                id
            }
            None => {
                self.report.properties_minted += 1;
                self.vocab.mint_property(name)
            }
        }
    }

    /// Write pending mentions onto the root, defining `mentions` itself first
    fn record_mentions(&mut self, graph: &mut EntityGraph) {
        let mut pending = self.vocab.take_mentions();
        if pending.is_empty() {
            return;
        }
        let property = self.ensure_property("mentions");
        let root_classes = self.class_ids(graph.root(), false);
        self.extend_domain(&property, &root_classes);
        pending.extend(self.vocab.take_mentions());

        let root = graph.root_mut();
        for id in pending {
            root.add_value("mentions", PropertyValue::Reference(EntityId::from(id)), false);
        }
    }
}

/// Types carried by a value: a nested entity's, or the referenced entity's
fn value_types<'g>(graph: &'g EntityGraph, value: &'g PropertyValue) -> Vec<&'g str> {
    let entity = match value {
        PropertyValue::Nested(entity) => Some(entity.as_ref()),
        PropertyValue::Reference(id) => graph.get(id),
        _ => None,
    };
    entity
        .map(|e| e.types.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContextMapping;
    use crate::vocab::dictionary::{EmptyDictionary, JsonLdDictionary};
    use crate::vocab::term::VocabularyTerm;

    const NS: &str = "https://example.org/vocab";

    fn run_pass(graph: &mut EntityGraph, vocab: &mut Vocabulary, dictionary: &dyn TermDictionary) -> VocabularyReport {
        let (prefixes, renames) = (PrefixMap::default(), LabelRenames::default());
        VocabularyPass::new(vocab, dictionary, &prefixes, &renames, "Relationship").run(graph)
    }

    fn sample_graph() -> EntityGraph {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#jane", "Person").with_text("name", "Jane Doe"));
        graph.add(
            Entity::new("#arc", "Entity")
                .with_text("name", "Letters")
                .with_text("arcreator", "Jane Doe")
                .with_reference("doprepared", "#jane"),
        );
        graph
    }

    #[test]
    fn mints_each_type_and_property_once() {
        let mut graph = sample_graph();
        let mut vocab = Vocabulary::new(NS);
        let report = run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        // Person, Entity, Dataset
        assert_eq!(report.classes_minted, 3);
        // name, arcreator, doprepared, mentions
        assert_eq!(report.properties_minted, 4);
        assert_eq!(vocab.classes().count(), 3);
        assert_eq!(vocab.properties().count(), 4);
    }

    #[test]
    fn domain_covers_every_type_using_the_property() {
        let mut graph = sample_graph();
        let mut vocab = Vocabulary::new(NS);
        run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        let name = vocab.get(&format!("{NS}#name")).unwrap();
        assert!(name.domain_includes.contains(&format!("{NS}#Person")));
        assert!(name.domain_includes.contains(&format!("{NS}#Entity")));
    }

    #[test]
    fn range_comes_from_referenced_entity_types() {
        let mut graph = sample_graph();
        let mut vocab = Vocabulary::new(NS);
        run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        let prepared = vocab.get(&format!("{NS}#doprepared")).unwrap();
        assert_eq!(prepared.range_includes, vec![format!("{NS}#Person")]);
        let creator = vocab.get(&format!("{NS}#arcreator")).unwrap();
        assert!(creator.range_includes.is_empty());
    }

    #[test]
    fn minted_terms_are_mentioned_by_root_dataset() {
        let mut graph = sample_graph();
        let mut vocab = Vocabulary::new(NS);
        run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        let mentions = graph.root().values("mentions");
        assert_eq!(mentions.len(), vocab.len());
        assert!(mentions.contains(&PropertyValue::reference(format!("{NS}#arcreator"))));
        assert!(vocab.contains(&format!("{NS}#mentions")));
    }

    #[test]
    fn relationship_classes_subclass_the_marker() {
        let mut graph = sample_graph();
        graph.add(
            Entity::new("#rel", "Relationship")
                .with_type("Creator")
                .with_reference("source", "#jane")
                .with_reference("target", "#arc"),
        );
        let mut vocab = Vocabulary::new(NS);
        run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        let creator = vocab.get(&format!("{NS}#Creator")).unwrap();
        assert_eq!(creator.sub_class_of, vec![format!("{NS}#Relationship")]);
        let marker = vocab.get(&format!("{NS}#Relationship")).unwrap();
        assert!(marker.sub_class_of.is_empty());

        let source_of = vocab.get(&format!("{NS}#sourceOf")).unwrap();
        assert_eq!(source_of.domain_includes, vec![format!("{NS}#Person")]);
        assert!(source_of.range_includes.contains(&format!("{NS}#Creator")));
        let target_of = vocab.get(&format!("{NS}#targetOf")).unwrap();
        assert_eq!(target_of.domain_includes, vec![format!("{NS}#Entity")]);
    }

    #[test]
    fn known_names_import_from_dictionary_instead_of_minting() {
        let dictionary = JsonLdDictionary::from_terms([
            VocabularyTerm::class("http://schema.org/Thing", "Thing"),
            VocabularyTerm::class("http://schema.org/Person", "Person").with_superclass("schema:Thing"),
            VocabularyTerm::property("http://schema.org/name", "name"),
        ]);
        let mut vocab = Vocabulary::new(NS);
        vocab.seed_context(&dictionary);

        let mut graph = sample_graph();
        let report = run_pass(&mut graph, &mut vocab, &dictionary);

        let person = vocab.get("http://schema.org/Person").unwrap();
        assert_eq!(person.origin, TermOrigin::Imported);
        assert_eq!(person.sub_class_of, vec!["http://schema.org/Thing"]);
        assert!(vocab.contains("http://schema.org/Thing"));
        assert!(!vocab.contains(&format!("{NS}#Person")));

        let name = vocab.get("http://schema.org/name").unwrap();
        assert_eq!(name.origin, TermOrigin::Local);
        assert_eq!(report.terms_imported, 2);
    }

    #[test]
    fn context_names_missing_from_dictionary_get_local_definitions() {
        let context: ContextMapping = [("Person", "http://xmlns.com/foaf/0.1/Person")]
            .into_iter()
            .collect();
        let mut vocab = Vocabulary::new(NS).with_context(context);
        let mut graph = sample_graph();
        let report = run_pass(&mut graph, &mut vocab, &EmptyDictionary);

        let person = vocab.get("http://xmlns.com/foaf/0.1/Person").unwrap();
        assert_eq!(person.origin, TermOrigin::Local);
        assert_eq!(report.unresolved, vec!["http://xmlns.com/foaf/0.1/Person"]);
    }

    #[test]
    fn mentions_is_defined_when_root_mints_the_first_term() {
        let dictionary = JsonLdDictionary::from_terms([
            VocabularyTerm::class("http://schema.org/Person", "Person"),
            VocabularyTerm::class("http://schema.org/Dataset", "Dataset"),
        ]);
        let mut vocab = Vocabulary::new(NS);
        vocab.seed_context(&dictionary);

        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#jane", "Person"));
        graph.add_group("entities", [EntityId::from("#jane")]);
        run_pass(&mut graph, &mut vocab, &dictionary);

        let root = graph.root();
        for key in root.data_keys() {
            let id = vocab
                .resolve_term(key)
                .unwrap_or_else(|| panic!("{key} does not resolve"));
            assert!(vocab.contains(id), "{key} has no definition");
        }
        let mentions = vocab.get(&format!("{NS}#mentions")).unwrap();
        assert_eq!(mentions.domain_includes, vec!["http://schema.org/Dataset"]);
        assert!(root
            .values("mentions")
            .contains(&PropertyValue::reference(format!("{NS}#mentions"))));
    }

    #[test]
    fn range_observations_flush_deduplicated() {
        let mut vocab = Vocabulary::new(NS);
        let id = vocab.mint_property("author");
        let mut ranges = RangeObservations::default();
        ranges.observe(&id, "http://schema.org/Person");
        ranges.observe(&id, "http://schema.org/Person");
        ranges.observe("https://unknown/prop", "http://schema.org/Person");
        assert_eq!(ranges.get(&id).map(|classes| classes.len()), Some(1));
        assert_eq!(ranges.len(), 2);

        assert_eq!(ranges.flush_into(&mut vocab), 1);
        assert_eq!(vocab.get(&id).unwrap().range_includes, vec!["http://schema.org/Person"]);
    }
}
