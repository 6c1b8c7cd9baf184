//! Vocabulary terms: class and property definitions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Comment placed on terms minted without any description
pub const PLACEHOLDER_COMMENT: &str = "...";

/// Whether a term defines a class or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    Class,
    Property,
}

impl TermKind {
    /// The `@type` a term of this kind carries
    pub fn rdf_type(&self) -> &'static str {
        match self {
            Self::Class => "rdfs:Class",
            Self::Property => "rdf:Property",
        }
    }

    fn from_types(types: &[&str]) -> Option<Self> {
        if types.iter().any(|t| matches!(*t, "rdfs:Class" | "http://www.w3.org/2000/01/rdf-schema#Class")) {
            Some(Self::Class)
        } else if types
            .iter()
            .any(|t| matches!(*t, "rdf:Property" | "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property"))
        {
            Some(Self::Property)
        } else {
            None
        }
    }
}

/// Where a term's definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermOrigin {
    /// Minted in the local namespace for a previously unknown name
    Minted,
    /// Copied from the external dictionary
    Imported,
    /// Loaded up front from an extension term set
    Extension,
    /// Defined locally under an IRI the context already knew
    Local,
}

/// A class or property definition
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyTerm {
    pub id: String,
    pub kind: TermKind,
    pub label: String,
    pub comment: String,
    /// Superclass IRIs (classes)
    pub sub_class_of: Vec<String>,
    /// Types observed carrying the property (properties)
    pub domain_includes: Vec<String>,
    /// Types observed as the property's values (properties)
    pub range_includes: Vec<String>,
    pub origin: TermOrigin,
    /// Any other structural metadata, passed through untouched
    pub extra: Map<String, Value>,
}

impl VocabularyTerm {
    fn new(id: impl Into<String>, kind: TermKind, label: impl Into<String>, origin: TermOrigin) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            comment: PLACEHOLDER_COMMENT.to_string(),
            sub_class_of: Vec::new(),
            domain_includes: Vec::new(),
            range_includes: Vec::new(),
            origin,
            extra: Map::new(),
        }
    }

    /// A locally minted class
    pub fn class(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, TermKind::Class, label, TermOrigin::Minted)
    }

    /// A locally minted property
    pub fn property(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, TermKind::Property, label, TermOrigin::Minted)
    }

    pub fn with_origin(mut self, origin: TermOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_superclass(mut self, id: impl Into<String>) -> Self {
        self.add_superclass(id);
        self
    }

    pub fn is_class(&self) -> bool {
        self.kind == TermKind::Class
    }

    pub fn is_property(&self) -> bool {
        self.kind == TermKind::Property
    }

    /// Add a superclass link; returns false if already present
    pub fn add_superclass(&mut self, id: impl Into<String>) -> bool {
        union_one(&mut self.sub_class_of, id.into())
    }

    /// Union type IRIs into `domainIncludes`; returns how many were new
    pub fn union_domain<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .map(|id| union_one(&mut self.domain_includes, id.into()) as usize)
            .sum()
    }

    /// Union type IRIs into `rangeIncludes`; returns how many were new
    pub fn union_range<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .map(|id| union_one(&mut self.range_includes, id.into()) as usize)
            .sum()
    }

    /// Parse a class or property node from a JSON-LD `@graph`.
    ///
    /// Returns `None` for nodes that are neither (enumeration members,
    /// datatypes without a class type, …) or that have no `@id`.
    pub fn from_jsonld(node: &Value) -> Option<Self> {
        let map = node.as_object()?;
        let id = map.get("@id")?.as_str()?;
        let types: Vec<&str> = match map.get("@type")? {
            Value::String(t) => vec![t.as_str()],
            Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
            _ => return None,
        };
        let kind = TermKind::from_types(&types)?;

        let label = map
            .get("rdfs:label")
            .and_then(literal_text)
            .unwrap_or_else(|| local_name(id).to_string());
        let mut term = Self::new(id, kind, label, TermOrigin::Imported);
        if let Some(comment) = map.get("rdfs:comment").and_then(literal_text) {
            term.comment = comment;
        }
        term.sub_class_of = map.get("rdfs:subClassOf").map(id_list).unwrap_or_default();
        term.domain_includes = first_present(map, &["domainIncludes", "schema:domainIncludes"]);
        term.range_includes = first_present(map, &["rangeIncludes", "schema:rangeIncludes"]);

        for (key, value) in map {
            if !is_structural_key(key) {
                term.extra.insert(key.clone(), value.clone());
            }
        }
        Some(term)
    }

    /// The term as a JSON-LD node
    pub fn to_jsonld(&self) -> Value {
        let mut map = Map::new();
        map.insert("@id".into(), json!(self.id));
        map.insert("@type".into(), json!(self.kind.rdf_type()));
        map.insert("name".into(), json!(self.label));
        map.insert("rdfs:label".into(), json!(self.label));
        map.insert("rdfs:comment".into(), json!(self.comment));
        match self.kind {
            TermKind::Class => {
                if !self.sub_class_of.is_empty() {
                    map.insert("rdfs:subClassOf".into(), id_objects(&self.sub_class_of));
                }
            }
            TermKind::Property => {
                map.insert("domainIncludes".into(), id_objects(&self.domain_includes));
                map.insert("rangeIncludes".into(), id_objects(&self.range_includes));
            }
        }
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(map)
    }
}

fn union_one(set: &mut Vec<String>, id: String) -> bool {
    if set.contains(&id) {
        return false;
    }
    set.push(id);
    true
}

/// The part of an IRI after the last `#`, `/` or `:`
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/', ':']).next().unwrap_or(iri)
}

fn is_structural_key(key: &str) -> bool {
    matches!(
        key,
        "@id"
            | "@type"
            | "name"
            | "rdfs:label"
            | "rdfs:comment"
            | "rdfs:subClassOf"
            | "domainIncludes"
            | "schema:domainIncludes"
            | "rangeIncludes"
            | "schema:rangeIncludes"
    )
}

/// Text of a literal: a string, `{"@value": …}`, or the first of an array
fn literal_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("@value").and_then(literal_text),
        Value::Array(items) => items.iter().find_map(literal_text),
        _ => None,
    }
}

/// IRIs from `{"@id": …}`, `"…"`, or arrays of either
fn id_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Object(map) => map
            .get("@id")
            .and_then(Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(id_list).collect(),
        _ => Vec::new(),
    }
}

fn first_present(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| map.get(*k))
        .map(id_list)
        .unwrap_or_default()
}

fn id_objects(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| json!({ "@id": id })).collect())
}
