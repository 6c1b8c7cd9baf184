//! Record group fixtures

use graphlink::RecordGroup;
use serde_json::{json, Value};

/// Namespace used for minted terms in tests
pub const NAMESPACE: &str = "https://example.org/vocab";

/// People, a document, and a relationship between them
pub fn creator_group() -> RecordGroup {
    RecordGroup::new(
        "entities",
        vec![
            json!({"@id": "#jane", "@type": "Person", "name": "Jane Doe"}),
            json!({"@id": "#doc1", "@type": "CreativeWork", "name": "Document 1"}),
            json!({
                "@id": "#rel1",
                "@type": ["Relationship", "Creator"],
                "source": {"@id": "#jane"},
                "target": {"@id": "#doc1"}
            }),
        ],
    )
}

/// Archival resources whose fields name other entities in plain text
pub fn archival_group() -> RecordGroup {
    RecordGroup::new(
        "archivalResources",
        vec![
            json!({
                "@id": "#arc1",
                "@type": "RepositoryObject",
                "name": "Letters to the Editor",
                "arcreator": "Jane Doe",
                "arsubject": ["Newspapers", "Document 1"],
                "place": {"@type": "Place", "name": "Sydney"}
            }),
            json!({
                "@id": "#arc2",
                "@type": "RepositoryObject",
                "name": "Unsigned notes",
                "arcreator": "Someone Unknown"
            }),
        ],
    )
}

/// A small dictionary document in schema.org's JSON-LD release shape
pub fn dictionary_fixture() -> Value {
    json!({
        "@context": {"schema": "http://schema.org/"},
        "@graph": [
            {"@id": "schema:Thing", "@type": "rdfs:Class", "rdfs:label": "Thing",
             "rdfs:comment": "The most generic type of item."},
            {"@id": "schema:CreativeWork", "@type": "rdfs:Class", "rdfs:label": "CreativeWork",
             "rdfs:subClassOf": {"@id": "schema:Thing"}},
            {"@id": "schema:MediaObject", "@type": "rdfs:Class", "rdfs:label": "MediaObject",
             "rdfs:subClassOf": {"@id": "schema:CreativeWork"}},
            {"@id": "schema:Person", "@type": "rdfs:Class", "rdfs:label": "Person",
             "rdfs:subClassOf": {"@id": "schema:Thing"}},
            {"@id": "schema:name", "@type": "rdf:Property", "rdfs:label": "name"}
        ]
    })
}
