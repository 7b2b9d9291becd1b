use std::sync::Arc;
use tessera_syntax::{entities_to_json, parse, Node, NodeId, Parser, PropertyValue};

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

#[test]
fn test_large_prefab_ranges_cover_entity_array() {
    let entities: Vec<String> = (0..5_000)
        .map(|i| format!("{{\"id\": {}, \"type\": \"Tile\", \"x\": {}}}", i, i % 64))
        .collect();
    let source = format!(
        "{{\n  \"version\": 4,\n  \"entities\": [\n    {}\n  ],\n  \"anchor\": [0, 0]\n}}\n",
        entities.join(",\n    ")
    );

    let (doc, warnings) = parse(source.as_bytes()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(doc.root().children().len(), 5_000);
    assert_eq!(doc.root().subtree_len(), 5_001);

    let range = doc.range("entities").unwrap();
    assert!(source[range.start..range.end].starts_with('['));
    assert!(source[range.start..range.end].ends_with(']'));
    assert_eq!(doc.metadata().keys().collect::<Vec<_>>(), vec!["version", "anchor"]);
}

#[test]
fn test_edit_deep_entity_keeps_other_subtrees() {
    let source = br#"{"entities": [
        {"id": "level", "children": [{"id": "door"}, {"id": "key"}]},
        {"id": "player", "hp": 10}
    ]}"#;
    let (doc, _) = parse(source).unwrap();

    let root = doc
        .root()
        .set_property(&id("door"), "locked", PropertyValue::literal(true))
        .unwrap();
    let edited = doc.with_root(root);

    assert!(Arc::ptr_eq(
        &doc.root().children()[1],
        &edited.root().children()[1]
    ));
    assert_eq!(
        serde_json::to_string(&entities_to_json(edited.root())).unwrap(),
        concat!(
            r#"[{"id":"level","children":[{"id":"door","locked":true},{"id":"key"}]},"#,
            r#"{"id":"player","hp":10}]"#
        )
    );
    assert_eq!(edited.raw(), doc.raw());
}

#[test]
fn test_custom_entity_field() {
    let source = br#"{"nodes": [{"id": "a"}], "entities": 5}"#;
    let (doc, _) = Parser::new("nodes").parse(source).unwrap();
    assert_eq!(doc.root().children().len(), 1);
    assert_eq!(doc.metadata()["entities"], serde_json::json!(5));
}

#[test]
fn test_programmatic_node_serializes_id() {
    let node = Node::new("Light")
        .with_id(id("sun"))
        .with_property("intensity", PropertyValue::literal(0.5));
    assert_eq!(
        serde_json::to_string(&tessera_syntax::to_json(&node)).unwrap(),
        r#"{"id":"sun","intensity":0.5}"#
    );
}
