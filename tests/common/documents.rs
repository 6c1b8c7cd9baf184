//! Lookups into serialized documents

use serde_json::Value;

/// The `@graph` array of a document
pub fn nodes(document: &Value) -> &[Value] {
    document["@graph"].as_array().map(Vec::as_slice).unwrap_or_default()
}

/// The node with `@id == id`, if any
pub fn node<'d>(document: &'d Value, id: &str) -> Option<&'d Value> {
    nodes(document).iter().find(|n| n["@id"] == id)
}

/// Drop what a vocabulary run adds to the graph document: the root's
/// `mentions` and the extra `@context` entries
pub fn strip_vocabulary_decoration(mut document: Value) -> Value {
    if let Some(context) = document["@context"].as_array_mut() {
        context.truncate(1);
    }
    if let Some(graph) = document["@graph"].as_array_mut() {
        for node in graph.iter_mut().filter(|n| n["@id"] == "./") {
            if let Some(map) = node.as_object_mut() {
                map.remove("mentions");
            }
        }
    }
    document
}
