//! End-to-end runs over in-memory and on-disk record groups

mod common;

use common::{archival_group, creator_group, node, strip_vocabulary_decoration, NAMESPACE};
use graphlink::vocab::EmptyDictionary;
use graphlink::{
    EntityId, MemorySink, MemorySource, Pipeline, PipelineOptions, PropertyValue, Vocabulary,
};
use serde_json::json;

async fn run(pipeline: Pipeline) -> MemorySink {
    let mut source = MemorySource::new([creator_group(), archival_group()]);
    let sink = MemorySink::new();
    pipeline.run(&mut source, &sink).await.unwrap();
    sink
}

#[tokio::test]
async fn relationship_is_named_and_back_referenced() {
    let sink = run(Pipeline::new(PipelineOptions::default())).await;
    let graph = sink.graph().unwrap();

    let rel = node(&graph, "#rel1").unwrap();
    assert_eq!(rel["name"], json!(["Jane Doe -> Creator -> Document 1"]));
    assert_eq!(rel["@type"], json!(["Creator"]));
    assert_eq!(node(&graph, "#jane").unwrap()["sourceOf"], json!([{"@id": "#rel1"}]));
    assert_eq!(node(&graph, "#doc1").unwrap()["targetOf"], json!([{"@id": "#rel1"}]));
}

#[tokio::test]
async fn text_naming_an_entity_becomes_a_reference() {
    let sink = run(Pipeline::new(PipelineOptions::default())).await;
    let graph = sink.graph().unwrap();

    let arc1 = node(&graph, "#arc1").unwrap();
    assert_eq!(arc1["arcreator"], json!([{"@id": "#jane"}]));
    assert_eq!(arc1["arsubject"], json!(["Newspapers", {"@id": "#doc1"}]));

    let arc2 = node(&graph, "#arc2").unwrap();
    assert_eq!(arc2["arcreator"], json!(["Someone Unknown"]));
}

#[tokio::test]
async fn nested_entities_are_flattened_and_grouped() {
    let sink = run(Pipeline::new(PipelineOptions::default())).await;
    let graph = sink.graph().unwrap();

    let place_ref = &node(&graph, "#arc1").unwrap()["place"][0]["@id"];
    let place_id = place_ref.as_str().unwrap();
    assert!(place_id.starts_with("_:"));
    assert_eq!(node(&graph, place_id).unwrap()["name"], json!(["Sydney"]));

    let root = node(&graph, "./").unwrap();
    assert_eq!(
        root["archivalResources"],
        json!([{"@id": "#arc1"}, {"@id": "#arc2"}])
    );
    assert_eq!(root["entities"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn vocabulary_only_decorates_the_graph() {
    let plain = run(Pipeline::new(PipelineOptions::default())).await;
    let enriched = run(
        Pipeline::new(PipelineOptions::default())
            .with_vocabulary(Vocabulary::new(NAMESPACE), EmptyDictionary),
    )
    .await;

    let enriched_graph = enriched.graph().unwrap();
    assert!(node(&enriched_graph, "./").unwrap().get("mentions").is_some());
    assert!(plain.vocabulary().is_none());
    assert!(enriched.vocabulary().is_some());
    assert_eq!(
        strip_vocabulary_decoration(plain.graph().unwrap()),
        strip_vocabulary_decoration(enriched_graph)
    );
}

#[test]
fn rewrite_runs_after_relationship_names_exist() {
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    pipeline.ingest_group(creator_group()).unwrap();
    pipeline
        .ingest_group(graphlink::RecordGroup::new(
            "notes",
            vec![json!({"@id": "#note", "@type": "Comment",
                        "about": "Jane Doe -> Creator -> Document 1"})],
        ))
        .unwrap();
    pipeline.link_relationships().unwrap();
    let report = pipeline.rewrite_names().unwrap();
    assert_eq!(report.values_rewritten, 1);

    let note = pipeline.graph().get(&EntityId::from("#note")).unwrap();
    assert_eq!(note.values("about"), &[PropertyValue::reference("#rel1")]);
}

#[tokio::test]
async fn dangling_endpoint_does_not_stop_the_run() {
    let mut source = MemorySource::new([graphlink::RecordGroup::new(
        "entities",
        vec![
            json!({"@id": "#doc1", "@type": "CreativeWork", "name": "Document 1"}),
            json!({"@id": "#rel1", "@type": ["Relationship", "Creator"],
                   "source": {"@id": "#gone"}, "target": {"@id": "#doc1"}}),
        ],
    )]);
    let sink = MemorySink::new();
    let report = Pipeline::new(PipelineOptions::default())
        .run(&mut source, &sink)
        .await
        .unwrap();

    assert_eq!(report.links.dangling.len(), 1);
    let graph = sink.graph().unwrap();
    assert_eq!(node(&graph, "#rel1").unwrap()["name"], json!(["Creator -> Document 1"]));
    assert_eq!(node(&graph, "#doc1").unwrap()["targetOf"], json!([{"@id": "#rel1"}]));
}
