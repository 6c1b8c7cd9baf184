//! EntityGraph: the indexed entity collection every pass works over

use super::entity::{Entity, EntityId, PropertyValue};
use std::collections::HashMap;
use thiserror::Error;

/// Identifier of the root dataset entity
pub const ROOT_DATASET_ID: &str = "./";

/// Type of the root dataset entity
pub const ROOT_DATASET_TYPE: &str = "Dataset";

/// Errors from graph mutation
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// An insertion-ordered collection of entities keyed by identifier.
///
/// Mutation is append-only: entities are never removed and properties are
/// only appended to or reassigned.
#[derive(Debug, Clone)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    root: EntityId,
}

impl Default for EntityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityGraph {
    /// Create a graph holding only the root dataset
    pub fn new() -> Self {
        Self::with_root(Entity::new(ROOT_DATASET_ID, ROOT_DATASET_TYPE))
    }

    /// Create a graph around a caller-supplied root dataset
    pub fn with_root(root: Entity) -> Self {
        let mut graph = Self {
            entities: Vec::new(),
            index: HashMap::new(),
            root: root.id.clone(),
        };
        graph.add(root);
        graph
    }

    /// Insert an entity; a no-op when the identifier is already present.
    ///
    /// Nested entities are flattened into top-level entities and replaced by
    /// references. Returns whether the outer entity was inserted.
    pub fn add(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }
        let mut flattened = Vec::new();
        flatten(entity, &mut flattened);
        for entity in flattened {
            if self.index.contains_key(&entity.id) {
                continue;
            }
            self.index.insert(entity.id.clone(), self.entities.len());
            self.entities.push(entity);
        }
        true
    }

    /// Get an entity by ID
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.index.get(id).map(|&i| &mut self.entities[i])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Append `value` to `property` on the entity `id`.
    ///
    /// See [`Entity::add_value`] for the duplicate rule.
    pub fn add_value(
        &mut self,
        id: &EntityId,
        property: &str,
        value: PropertyValue,
        allow_duplicates: bool,
    ) -> GraphResult<bool> {
        let entity = self
            .get_mut(id)
            .ok_or_else(|| GraphError::EntityNotFound(id.clone()))?;
        Ok(entity.add_value(property, value, allow_duplicates))
    }

    pub fn root_id(&self) -> &EntityId {
        &self.root
    }

    pub fn root(&self) -> &Entity {
        &self.entities[self.index[&self.root]]
    }

    pub fn root_mut(&mut self) -> &mut Entity {
        let i = self.index[&self.root];
        &mut self.entities[i]
    }

    /// Attach a named grouping of entities to the root dataset
    pub fn add_group(&mut self, name: &str, members: impl IntoIterator<Item = EntityId>) {
        let root = self.root_mut();
        for id in members {
            root.add_value(name, PropertyValue::Reference(id), false);
        }
    }

    /// Snapshot of all identifiers, in insertion order
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id.clone()).collect()
    }

    /// All entities, in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Entities carrying the given type
    pub fn entities_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.entities.iter().filter(move |e| e.has_type(type_name))
    }

    /// Get the number of entities (including the root dataset)
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Depth-first flattening: the entity first, then each nested entity.
fn flatten(mut entity: Entity, out: &mut Vec<Entity>) {
    let mut nested = Vec::new();
    for values in entity.properties.values_mut() {
        for value in values.iter_mut() {
            if let PropertyValue::Nested(inner) = value {
                let reference = PropertyValue::Reference(inner.id.clone());
                if let PropertyValue::Nested(inner) = std::mem::replace(value, reference) {
                    nested.push(*inner);
                }
            }
        }
    }
    out.push(entity);
    for inner in nested {
        flatten(inner, out);
    }
}
