//! Name index: turns scalar values that name another entity into references

use crate::graph::{is_metadata_key, EntityGraph, EntityId, PropertyValue};
use std::borrow::Cow;
use std::collections::HashMap;

/// Two entities indexed under the same display name
#[derive(Debug, Clone, PartialEq)]
pub struct NameCollision {
    pub name: String,
    /// The entity that lost the slot
    pub replaced: EntityId,
    /// The entity now indexed under the name
    pub kept: EntityId,
}

/// Summary of a rewrite pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteReport {
    pub names_indexed: usize,
    pub values_rewritten: usize,
    pub entities_touched: usize,
    pub collisions: Vec<NameCollision>,
}

/// Display name -> entity, built once after relationship names are final.
///
/// When two entities share a name the one indexed last wins; the collision
/// is recorded.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, EntityId>,
    collisions: Vec<NameCollision>,
}

impl NameIndex {
    /// Index every non-empty textual `name` of every entity
    pub fn build(graph: &EntityGraph) -> Self {
        let mut index = Self::default();
        for entity in graph.entities() {
            for name in entity.values("name").iter().filter_map(PropertyValue::as_text) {
                if name.is_empty() {
                    continue;
                }
                if let Some(previous) = index.names.insert(name.to_string(), entity.id.clone()) {
                    if previous != entity.id {
                        tracing::debug!(name, kept = %entity.id, replaced = %previous, "name collision");
                        index.collisions.push(NameCollision {
                            name: name.to_string(),
                            replaced: previous,
                            kept: entity.id.clone(),
                        });
                    }
                }
            }
        }
        index
    }

    pub fn resolve(&self, name: &str) -> Option<&EntityId> {
        self.names.get(name)
    }

    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Replace scalar values whose rendered text exactly matches an indexed
    /// name with a reference to that entity.
    ///
    /// `name` and `@` keys are left alone. Rewritten values are references,
    /// so a second run changes nothing.
    pub fn rewrite(&self, graph: &mut EntityGraph) -> RewriteReport {
        let mut report = RewriteReport {
            names_indexed: self.names.len(),
            collisions: self.collisions.clone(),
            ..Default::default()
        };

        for entity in graph.entities_mut() {
            let mut touched = false;
            for (key, values) in entity.properties.iter_mut() {
                if key == "name" || is_metadata_key(key) {
                    continue;
                }
                for value in values.iter_mut() {
                    let Some(id) = rendered_scalar(value).and_then(|text| self.names.get(text.as_ref())) else {
                        continue;
                    };
                    *value = PropertyValue::Reference(id.clone());
                    report.values_rewritten += 1;
                    touched = true;
                }
            }
            if touched {
                report.entities_touched += 1;
            }
        }

        tracing::info!(
            names = report.names_indexed,
            rewritten = report.values_rewritten,
            collisions = report.collisions.len(),
            "name references rewritten"
        );
        report
    }
}

/// Text as written; numbers and booleans as they serialize
fn rendered_scalar(value: &PropertyValue) -> Option<Cow<'_, str>> {
    match value {
        PropertyValue::Text(text) => Some(Cow::Borrowed(text)),
        PropertyValue::Number(number) => Some(Cow::Owned(number.to_string())),
        PropertyValue::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        PropertyValue::Reference(_) | PropertyValue::Nested(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Entity;

    fn graph() -> EntityGraph {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#jane", "Person").with_text("name", "Jane Doe"));
        graph.add(
            Entity::new("#arc", "Entity")
                .with_text("name", "Letters")
                .with_text("arcreator", "Jane Doe")
                .with_text("arsubtitle", "Nobody In Particular"),
        );
        graph
    }

    #[test]
    fn matching_text_becomes_reference() {
        let mut graph = graph();
        let report = NameIndex::build(&graph).rewrite(&mut graph);

        let arc = graph.get(&EntityId::from("#arc")).unwrap();
        assert_eq!(arc.values("arcreator"), &[PropertyValue::reference("#jane")]);
        assert_eq!(arc.values("arsubtitle"), &[PropertyValue::text("Nobody In Particular")]);
        assert_eq!(report.values_rewritten, 1);
        assert_eq!(report.entities_touched, 1);
    }

    #[test]
    fn name_property_is_never_rewritten() {
        let mut graph = graph();
        graph.add(Entity::new("#jane2", "Person").with_text("name", "Letters"));
        NameIndex::build(&graph).rewrite(&mut graph);

        let arc = graph.get(&EntityId::from("#arc")).unwrap();
        assert_eq!(arc.display_name(), Some("Letters"));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let mut graph = graph();
        let index = NameIndex::build(&graph);
        index.rewrite(&mut graph);
        let once: Vec<_> = graph.entities().cloned().collect();

        let again = NameIndex::build(&graph).rewrite(&mut graph);
        let twice: Vec<_> = graph.entities().cloned().collect();
        assert_eq!(again.values_rewritten, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn last_indexed_entity_wins_collisions() {
        let mut graph = graph();
        graph.add(Entity::new("#jane-b", "Person").with_text("name", "Jane Doe"));
        let index = NameIndex::build(&graph);

        assert_eq!(index.resolve("Jane Doe"), Some(&EntityId::from("#jane-b")));
        assert_eq!(
            index.collisions(),
            &[NameCollision {
                name: "Jane Doe".into(),
                replaced: EntityId::from("#jane"),
                kept: EntityId::from("#jane-b"),
            }]
        );
    }

    #[test]
    fn numeric_value_matching_a_name_becomes_reference() {
        let mut graph = graph();
        graph.add(Entity::new("#y1901", "Year").with_text("name", "1901"));
        graph.add(
            Entity::new("#born", "Event")
                .with_value("year", PropertyValue::Number(1901.into()))
                .with_value("recorded", PropertyValue::Bool(true)),
        );
        let report = NameIndex::build(&graph).rewrite(&mut graph);

        let born = graph.get(&EntityId::from("#born")).unwrap();
        assert_eq!(born.values("year"), &[PropertyValue::reference("#y1901")]);
        assert_eq!(born.values("recorded"), &[PropertyValue::Bool(true)]);
        assert_eq!(report.values_rewritten, 2);
    }

    #[test]
    fn empty_names_are_not_indexed() {
        let mut graph = EntityGraph::new();
        graph.add(Entity::new("#blank", "Thing").with_text("name", ""));
        graph.add(Entity::new("#x", "Thing").with_text("note", ""));
        let index = NameIndex::build(&graph);
        assert!(index.is_empty());
        index.rewrite(&mut graph);
        assert_eq!(
            graph.get(&EntityId::from("#x")).unwrap().values("note"),
            &[PropertyValue::text("")]
        );
    }
}
