//! Relationship linking: back-references and display names
//!
//! A relationship entity points at a `source` and a `target`. Linking adds
//! the relationship to the source's `sourceOf` and the target's `targetOf`,
//! names it `<source> -> <type> -> <target>`, and then drops the generic
//! marker type if a more specific one remains.

use crate::graph::{Entity, EntityGraph, EntityId, PropertyValue};

/// Default type marking an entity as a relationship
pub const RELATIONSHIP_MARKER: &str = "Relationship";

/// Which end of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    /// Property on the relationship naming this endpoint
    pub fn property(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }

    /// Property on the endpoint entity pointing back at the relationship
    pub fn back_reference(&self) -> &'static str {
        match self {
            Self::Source => "sourceOf",
            Self::Target => "targetOf",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.property())
    }
}

/// A relationship endpoint that is missing or not in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct DanglingReference {
    pub relationship: EntityId,
    pub endpoint: Endpoint,
    /// The id that failed to resolve; `None` if the property was absent
    pub missing: Option<EntityId>,
}

/// Summary of a linking pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkReport {
    pub relationships: usize,
    pub sources_linked: usize,
    pub targets_linked: usize,
    pub markers_removed: usize,
    pub dangling: Vec<DanglingReference>,
}

/// Links relationship entities to their endpoints
#[derive(Debug, Clone)]
pub struct RelationshipLinker {
    marker: String,
}

impl Default for RelationshipLinker {
    fn default() -> Self {
        Self::new(RELATIONSHIP_MARKER)
    }
}

impl RelationshipLinker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Link every relationship entity in the graph.
    ///
    /// Unresolvable endpoints are reported and skipped; the other endpoint
    /// is still linked.
    pub fn link(&self, graph: &mut EntityGraph) -> LinkReport {
        let relationships: Vec<EntityId> = graph
            .entities_of_type(&self.marker)
            .map(|e| e.id.clone())
            .collect();

        let mut report = LinkReport::default();
        for id in relationships {
            self.link_one(graph, &id, &mut report);
        }

        tracing::info!(
            relationships = report.relationships,
            dangling = report.dangling.len(),
            "relationships linked"
        );
        report
    }

    fn link_one(&self, graph: &mut EntityGraph, id: &EntityId, report: &mut LinkReport) {
        let Some(relationship) = graph.get(id) else {
            return;
        };
        report.relationships += 1;
        let type_segment = self.type_segment(relationship);
        let source = relationship.first("source").and_then(PropertyValue::as_entity_id);
        let target = relationship.first("target").and_then(PropertyValue::as_entity_id);

        let mut segments = Vec::with_capacity(3);
        if let Some(name) = self.attach(graph, id, Endpoint::Source, source, report) {
            segments.push(name);
            report.sources_linked += 1;
        }
        segments.push(type_segment);
        if let Some(name) = self.attach(graph, id, Endpoint::Target, target, report) {
            segments.push(name);
            report.targets_linked += 1;
        }

        let Some(relationship) = graph.get_mut(id) else {
            return;
        };
        let display_name = segments.join(" -> ");
        tracing::debug!(relationship = %id, name = %display_name, "named relationship");
        relationship.set_property("name", vec![PropertyValue::Text(display_name)]);
        if relationship.remove_type(&self.marker) {
            report.markers_removed += 1;
        }
    }

    /// Add the back-reference on one endpoint and return its display name
    fn attach(
        &self,
        graph: &mut EntityGraph,
        relationship: &EntityId,
        endpoint: Endpoint,
        endpoint_id: Option<EntityId>,
        report: &mut LinkReport,
    ) -> Option<String> {
        let found = match &endpoint_id {
            Some(eid) => graph.get_mut(eid),
            None => None,
        };
        let Some(entity) = found else {
            tracing::warn!(
                relationship = %relationship,
                endpoint = %endpoint,
                missing = ?endpoint_id.as_ref().map(EntityId::as_str),
                "can't find relationship {}", endpoint
            );
            report.dangling.push(DanglingReference {
                relationship: relationship.clone(),
                endpoint,
                missing: endpoint_id,
            });
            return None;
        };
        entity.add_value(
            endpoint.back_reference(),
            PropertyValue::Reference(relationship.clone()),
            false,
        );
        Some(
            entity
                .display_name()
                .map(str::to_string)
                .unwrap_or_else(|| entity.id.to_string()),
        )
    }

    /// The relationship's specific types, or the marker if it has none
    fn type_segment(&self, relationship: &Entity) -> String {
        let specific: Vec<&str> = relationship
            .types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != self.marker)
            .collect();
        if specific.is_empty() {
            self.marker.clone()
        } else {
            specific.join(",")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator_graph() -> EntityGraph {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#jane", "Person").with_text("name", "Jane Doe"));
        graph.add(Entity::new("#doc1", "CreativeWork").with_text("name", "Document 1"));
        graph.add(
            Entity::new("#rel1", RELATIONSHIP_MARKER)
                .with_type("Creator")
                .with_reference("source", "#jane")
                .with_reference("target", "#doc1"),
        );
        graph
    }

    fn get<'g>(graph: &'g EntityGraph, id: &str) -> &'g Entity {
        graph.get(&EntityId::from(id)).unwrap()
    }

    #[test]
    fn links_both_endpoints_and_names_relationship() {
        let mut graph = creator_graph();
        let report = RelationshipLinker::default().link(&mut graph);

        let rel = get(&graph, "#rel1");
        assert_eq!(rel.display_name(), Some("Jane Doe -> Creator -> Document 1"));
        assert_eq!(rel.types, vec!["Creator"]);
        assert_eq!(get(&graph, "#jane").values("sourceOf"), &[PropertyValue::reference("#rel1")]);
        assert_eq!(get(&graph, "#doc1").values("targetOf"), &[PropertyValue::reference("#rel1")]);
        assert_eq!(report.relationships, 1);
        assert!(report.dangling.is_empty());
    }

    #[test]
    fn relinking_does_not_duplicate_back_references() {
        let mut graph = creator_graph();
        let linker = RelationshipLinker::default();
        linker.link(&mut graph);
        graph
            .get_mut(&EntityId::from("#rel1"))
            .unwrap()
            .types
            .push(RELATIONSHIP_MARKER.to_string());
        linker.link(&mut graph);

        assert_eq!(get(&graph, "#jane").values("sourceOf").len(), 1);
        assert_eq!(get(&graph, "#doc1").values("targetOf").len(), 1);
    }

    #[test]
    fn dangling_source_still_links_target() {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#doc1", "CreativeWork").with_text("name", "Document 1"));
        graph.add(
            Entity::new("#rel1", RELATIONSHIP_MARKER)
                .with_type("Creator")
                .with_reference("source", "#nobody")
                .with_reference("target", "#doc1"),
        );
        let report = RelationshipLinker::default().link(&mut graph);

        assert_eq!(get(&graph, "#rel1").display_name(), Some("Creator -> Document 1"));
        assert_eq!(get(&graph, "#doc1").values("targetOf").len(), 1);
        assert_eq!(
            report.dangling,
            vec![DanglingReference {
                relationship: EntityId::from("#rel1"),
                endpoint: Endpoint::Source,
                missing: Some(EntityId::from("#nobody")),
            }]
        );
    }

    #[test]
    fn missing_target_property_is_reported() {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#jane", "Person").with_text("name", "Jane Doe"));
        graph.add(Entity::new("#rel1", RELATIONSHIP_MARKER).with_reference("source", "#jane"));
        let report = RelationshipLinker::default().link(&mut graph);

        assert_eq!(get(&graph, "#rel1").display_name(), Some("Jane Doe -> Relationship"));
        assert_eq!(report.dangling[0].endpoint, Endpoint::Target);
        assert_eq!(report.dangling[0].missing, None);
    }

    #[test]
    fn marker_only_relationship_keeps_its_type() {
        let mut graph = creator_graph();
        graph.add(
            Entity::new("#rel2", RELATIONSHIP_MARKER)
                .with_reference("source", "#jane")
                .with_reference("target", "#doc1"),
        );
        let report = RelationshipLinker::default().link(&mut graph);

        assert_eq!(get(&graph, "#rel2").types, vec![RELATIONSHIP_MARKER]);
        assert_eq!(
            get(&graph, "#rel2").display_name(),
            Some("Jane Doe -> Relationship -> Document 1")
        );
        assert_eq!(report.markers_removed, 1);
    }

    #[test]
    fn unnamed_endpoint_falls_back_to_id() {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#anon", "Person"));
        graph.add(Entity::new("#doc1", "CreativeWork").with_text("name", "Document 1"));
        graph.add(
            Entity::new("#rel1", RELATIONSHIP_MARKER)
                .with_type("Creator")
                .with_text("source", "#anon")
                .with_reference("target", "#doc1"),
        );
        RelationshipLinker::default().link(&mut graph);
        assert_eq!(get(&graph, "#rel1").display_name(), Some("#anon -> Creator -> Document 1"));
    }
}
