//! Entity representation in the linked graph

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an entity
///
/// Serializes as a plain string (`#Jane%20Doe`, `./`, `_:…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an EntityId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic blank-node id for an anonymous nested entity.
    ///
    /// Derived from the owner, the property and the value's position so the
    /// same record always flattens to the same ids.
    pub fn blank(owner: &EntityId, property: &str, position: usize) -> Self {
        let seed = format!("{}\u{1f}{}\u{1f}{}", owner.0, property, position);
        Self(format!("_:{}", Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes())))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.starts_with("_:")
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single value stored under an entity property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    /// Structural link to another entity (`{"@id": …}`)
    Reference(EntityId),
    /// An entity embedded in a record; flattened when added to a graph
    Nested(Box<Entity>),
}

impl PropertyValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn reference(id: impl Into<EntityId>) -> Self {
        Self::Reference(id.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityId> {
        match self {
            Self::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// The entity this value points at: a reference, or text naming an id
    pub fn as_entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Reference(id) => Some(id.clone()),
            Self::Text(s) => Some(EntityId::from(s.as_str())),
            Self::Nested(entity) => Some(entity.id.clone()),
            _ => None,
        }
    }

    /// Text, number or boolean
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Number(_) | Self::Bool(_))
    }

    /// Parse one JSON-LD value of `property` on `owner`.
    ///
    /// Returns `Ok(None)` for `null`. `position` seeds the blank id of an
    /// anonymous nested object.
    fn from_json(
        value: &Value,
        owner: &EntityId,
        property: &str,
        position: usize,
    ) -> Result<Option<Self>, RecordError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::Text(s.clone()))),
            Value::Number(n) => Ok(Some(Self::Number(n.clone()))),
            Value::Bool(b) => Ok(Some(Self::Bool(*b))),
            Value::Object(map) => {
                let id = map.get("@id").and_then(Value::as_str);
                if let (Some(id), 1) = (id, map.len()) {
                    return Ok(Some(Self::Reference(EntityId::from(id))));
                }
                if let Some(literal) = map.get("@value") {
                    return Self::from_json(literal, owner, property, position);
                }
                let id = match id {
                    Some(id) => EntityId::from(id),
                    None => EntityId::blank(owner, property, position),
                };
                let nested = Entity::from_map(id, map).map_err(|_| RecordError::InvalidValue {
                    id: owner.clone(),
                    property: property.to_string(),
                })?;
                Ok(Some(Self::Nested(Box::new(nested))))
            }
            Value::Array(_) => Err(RecordError::InvalidValue {
                id: owner.clone(),
                property: property.to_string(),
            }),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => n.serialize(serializer),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Reference(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("@id", id)?;
                map.end()
            }
            Self::Nested(entity) => entity.serialize(serializer),
        }
    }
}

/// Why a record could not become an entity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no @id")]
    MissingId,

    #[error("record {0} has no @type")]
    MissingType(EntityId),

    #[error("record {id} has an unsupported value under {property}")]
    InvalidValue { id: EntityId, property: String },
}

/// Keys beginning with `@` carry JSON-LD structure, not data
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with('@')
}

/// Property values, always stored as sequences
pub type Properties = BTreeMap<String, Vec<PropertyValue>>;

/// A node in the linked graph
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,
    /// Type names; the first is the primary type. Never empty.
    pub types: Vec<String>,
    /// Property name -> ordered values
    pub properties: Properties,
}

impl Entity {
    /// Create a new entity with a primary type
    pub fn new(id: impl Into<EntityId>, primary_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: vec![primary_type.into()],
            properties: BTreeMap::new(),
        }
    }

    /// Add a further type
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !self.types.contains(&type_name) {
            self.types.push(type_name);
        }
        self
    }

    /// Append a value to a property
    pub fn with_value(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.entry(key.into()).or_default().push(value);
        self
    }

    /// Append a text value to a property
    pub fn with_text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_value(key, PropertyValue::text(text))
    }

    /// Append a reference to a property
    pub fn with_reference(self, key: impl Into<String>, id: impl Into<EntityId>) -> Self {
        self.with_value(key, PropertyValue::reference(id))
    }

    pub fn primary_type(&self) -> &str {
        self.types.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }

    /// Values of a property (empty when absent)
    pub fn values(&self, key: &str) -> &[PropertyValue] {
        self.properties.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, key: &str) -> Option<&PropertyValue> {
        self.values(key).first()
    }

    /// First textual `name`
    pub fn display_name(&self) -> Option<&str> {
        self.values("name").iter().find_map(PropertyValue::as_text)
    }

    /// Property keys that carry data (no `@` keys)
    pub fn data_keys(&self) -> impl Iterator<Item = &str> {
        self.properties
            .keys()
            .map(String::as_str)
            .filter(|k| !is_metadata_key(k))
    }

    /// Append `value` under `key`.
    ///
    /// With `allow_duplicates == false` the append is skipped when an equal
    /// value is already present. Returns whether the value was appended.
    pub fn add_value(&mut self, key: &str, value: PropertyValue, allow_duplicates: bool) -> bool {
        let values = self.properties.entry(key.to_string()).or_default();
        if !allow_duplicates && values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Replace every value of a property
    pub fn set_property(&mut self, key: impl Into<String>, values: Vec<PropertyValue>) {
        self.properties.insert(key.into(), values);
    }

    /// Remove a type unless it is the last one. Returns whether it was removed.
    pub fn remove_type(&mut self, type_name: &str) -> bool {
        if !self.has_type(type_name) || self.types.iter().all(|t| t == type_name) {
            return false;
        }
        self.types.retain(|t| t != type_name);
        true
    }

    /// Build an entity from a flat JSON-LD record.
    ///
    /// `@id` must be a string and `@type` a string or non-empty array.
    /// Arrays are spread into the value sequence and `null`s are dropped.
    pub fn from_record(record: &Value) -> Result<Self, RecordError> {
        let map = record.as_object().ok_or(RecordError::NotAnObject)?;
        let id = map
            .get("@id")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingId)?;
        Self::from_map(EntityId::from(id), map)
    }

    fn from_map(id: EntityId, map: &Map<String, Value>) -> Result<Self, RecordError> {
        let types: Vec<String> = match map.get("@type") {
            Some(Value::String(t)) => vec![t.clone()],
            Some(Value::Array(ts)) => ts
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        if types.is_empty() {
            return Err(RecordError::MissingType(id));
        }

        let mut entity = Self {
            id,
            types: Vec::new(),
            properties: BTreeMap::new(),
        };
        for t in types {
            entity = entity.with_type(t);
        }

        for (key, raw) in map {
            if is_metadata_key(key) {
                continue;
            }
            let raw_values: Vec<&Value> = match raw {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for (position, raw_value) in raw_values.into_iter().enumerate() {
                match PropertyValue::from_json(raw_value, &entity.id, key, position) {
                    Ok(Some(value)) => entity.properties.entry(key.clone()).or_default().push(value),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("dropping value: {}", e),
                }
            }
        }

        Ok(entity)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 2))?;
        map.serialize_entry("@id", &self.id)?;
        map.serialize_entry("@type", &self.types)?;
        for (key, values) in &self.properties {
            map.serialize_entry(key, &ValueSeq(values))?;
        }
        map.end()
    }
}

struct ValueSeq<'a>(&'a [PropertyValue]);

impl Serialize for ValueSeq<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in self.0 {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_with_single_type_and_scalars() {
        let entity = Entity::from_record(&json!({
            "@id": "#jane",
            "@type": "Person",
            "name": "Jane Doe",
            "birthYear": 1901,
            "living": false
        }))
        .unwrap();

        assert_eq!(entity.id.as_str(), "#jane");
        assert_eq!(entity.types, vec!["Person"]);
        assert_eq!(entity.primary_type(), "Person");
        assert_eq!(entity.display_name(), Some("Jane Doe"));
        assert_eq!(entity.values("living"), &[PropertyValue::Bool(false)]);
        assert!(entity.first("birthYear").unwrap().is_scalar());
    }

    #[test]
    fn record_without_id_or_type_is_rejected() {
        assert_eq!(
            Entity::from_record(&json!({"@type": "Person"})),
            Err(RecordError::MissingId)
        );
        assert_eq!(
            Entity::from_record(&json!({"@id": "#x", "@type": []})),
            Err(RecordError::MissingType(EntityId::from("#x")))
        );
        assert_eq!(Entity::from_record(&json!("nope")), Err(RecordError::NotAnObject));
    }

    #[test]
    fn id_only_objects_become_references() {
        let entity = Entity::from_record(&json!({
            "@id": "#doc",
            "@type": ["File", "DigitalObject"],
            "linkedArchivalResource": {"@id": "#arc1"},
            "author": [{"@id": "#a"}, {"@id": "#b"}],
            "note": null
        }))
        .unwrap();

        assert_eq!(entity.types, vec!["File", "DigitalObject"]);
        assert_eq!(
            entity.first("linkedArchivalResource").and_then(PropertyValue::as_reference),
            Some(&EntityId::from("#arc1"))
        );
        assert_eq!(entity.values("author").len(), 2);
        assert!(entity.values("note").is_empty());
    }

    #[test]
    fn anonymous_nested_objects_get_stable_blank_ids() {
        let record = json!({
            "@id": "#doc",
            "@type": "File",
            "place": {"@type": "Place", "name": "Melbourne"}
        });
        let a = Entity::from_record(&record).unwrap();
        let b = Entity::from_record(&record).unwrap();

        let PropertyValue::Nested(place) = a.first("place").unwrap() else {
            panic!("expected nested place");
        };
        assert!(place.id.is_blank());
        assert_eq!(a, b);
    }

    #[test]
    fn value_objects_unwrap_to_scalars() {
        let entity = Entity::from_record(&json!({
            "@id": "#x",
            "@type": "Thing",
            "description": {"@value": "plain", "@language": "en"}
        }))
        .unwrap();
        assert_eq!(entity.first("description").and_then(PropertyValue::as_text), Some("plain"));
    }

    #[test]
    fn nested_arrays_are_dropped_not_fatal() {
        let entity = Entity::from_record(&json!({
            "@id": "#x",
            "@type": "Thing",
            "keywords": [["a", "b"], "c"]
        }))
        .unwrap();
        assert_eq!(entity.values("keywords"), &[PropertyValue::text("c")]);
    }

    #[test]
    fn add_value_respects_duplicate_flag() {
        let mut entity = Entity::new("#a", "Person");
        assert!(entity.add_value("sourceOf", PropertyValue::reference("#r"), false));
        assert!(!entity.add_value("sourceOf", PropertyValue::reference("#r"), false));
        assert!(entity.add_value("sourceOf", PropertyValue::reference("#r"), true));
        assert_eq!(entity.values("sourceOf").len(), 2);
    }

    #[test]
    fn remove_type_never_empties_the_type_set() {
        let mut only_marker = Entity::new("#r", "Relationship");
        assert!(!only_marker.remove_type("Relationship"));
        assert_eq!(only_marker.types, vec!["Relationship"]);

        let mut typed = Entity::new("#r", "Relationship").with_type("Creator");
        assert!(typed.remove_type("Relationship"));
        assert_eq!(typed.types, vec!["Creator"]);
    }
}
