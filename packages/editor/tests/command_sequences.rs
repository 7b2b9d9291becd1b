//! Tests for longer command sequences
//!
//! This tests:
//! - Reorder + rename + delete chains
//! - Undo/redo sequences
//! - Batched commands
//! - Document integrity after operations

use std::sync::Arc;
use tessera_editor::{
    Command, DocumentState, HistoryConfig, Node, NodeCommand, NodeId, PropertyValue, UndoStack,
};
use tessera_syntax::{entities_to_json, parse, Parser};

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

fn state(source: &str) -> DocumentState {
    let (doc, _) = parse(source.as_bytes()).unwrap();
    DocumentState::new(doc, HistoryConfig::default())
}

fn order(state: &DocumentState) -> Vec<String> {
    state
        .root()
        .children()
        .iter()
        .map(|c| c.id().map(|id| id.to_string()).unwrap_or_default())
        .collect()
}

#[test]
fn test_reorder_then_delete_sequence() {
    let mut state =
        state(r#"{"entities": [{"id": "a", "children": [{"id": "a1"}]}, {"id": "b"}]}"#);

    let reorder = NodeCommand::reorder(state.root(), id("a"), 1).unwrap();
    state.execute_command(reorder, false).unwrap();
    assert_eq!(order(&state), vec!["b", "a"]);

    // Delete a (takes a1 with it)
    let delete = NodeCommand::delete_element(state.root(), &id("a")).unwrap();
    state.execute_command(delete, false).unwrap();
    assert!(state.document().find(&id("a1")).is_none());

    // Undo delete restores the whole subtree in place
    state.undo().unwrap();
    assert_eq!(order(&state), vec!["b", "a"]);
    assert!(state.document().find(&id("a1")).is_some());

    // Undo reorder
    state.undo().unwrap();
    assert_eq!(order(&state), vec!["a", "b"]);
}

#[test]
fn test_multiple_updates_with_undo_redo() {
    let mut state = state(r#"{"entities": [{"id": "t", "label": "v0"}]}"#);

    for i in 1..=3 {
        let command = NodeCommand::set_property(
            state.root(),
            id("t"),
            "label",
            PropertyValue::literal(format!("v{}", i)),
        )
        .unwrap();
        state.execute_command(command, false).unwrap();
    }
    let label = |state: &DocumentState| {
        state.document().find(&id("t")).unwrap().property("label").cloned()
    };
    assert_eq!(label(&state), Some(PropertyValue::literal("v3")));

    state.undo().unwrap();
    state.undo().unwrap();
    assert_eq!(label(&state), Some(PropertyValue::literal("v1")));

    state.redo().unwrap();
    assert_eq!(label(&state), Some(PropertyValue::literal("v2")));
    assert_eq!(state.status().redo_depth, 1);
}

#[test]
fn test_batched_updates() {
    let mut state = state(r#"{"entities": [{"id": "card"}, {"id": "title"}]}"#);
    let root = Arc::clone(state.root());

    let batch = NodeCommand::batch(
        "Redesign card",
        vec![
            NodeCommand::set_property(&root, id("card"), "width", PropertyValue::literal(200))
                .unwrap(),
            NodeCommand::set_property(&root, id("title"), "bold", PropertyValue::literal(true))
                .unwrap(),
            NodeCommand::rename(&root, id("title"), id("heading")).unwrap(),
        ],
    );
    state.execute_command(batch, false).unwrap();

    assert_eq!(state.status().undo_depth, 1);
    assert_eq!(state.status().undo_description.as_deref(), Some("Redesign card"));
    assert!(state.document().find(&id("heading")).is_some());

    state.undo().unwrap();
    assert_eq!(state.root(), &root);
}

#[test]
fn test_insert_and_remove_sequence() {
    let mut state = state(r#"{"entities": [{"id": "a"}]}"#);

    for (i, name) in ["b", "c", "d"].iter().enumerate() {
        let add =
            NodeCommand::add_element(None, i + 1, Node::new("entity").with_id(id(name))).unwrap();
        state.execute_command(add, false).unwrap();
    }
    assert_eq!(order(&state), vec!["a", "b", "c", "d"]);

    let delete = NodeCommand::delete_element(state.root(), &id("c")).unwrap();
    state.execute_command(delete, false).unwrap();
    assert_eq!(order(&state), vec!["a", "b", "d"]);

    // Adding an id that already exists is rejected and leaves history alone
    let dup = NodeCommand::add_element(None, 0, Node::new("entity").with_id(id("a"))).unwrap();
    assert!(state.execute_command(dup, false).is_err());
    assert_eq!(state.status().undo_depth, 4);

    while state.undo().unwrap() {}
    assert_eq!(order(&state), vec!["a"]);
}

#[test]
fn test_set_and_remove_property() {
    let mut state = state(r#"{"entities": [{"id": "div"}]}"#);

    let value = PropertyValue::literal("original");
    let set = NodeCommand::set_property(state.root(), id("div"), "class", value).unwrap();
    state.execute_command(set, false).unwrap();
    let value = PropertyValue::literal("changed");
    let set = NodeCommand::set_property(state.root(), id("div"), "class", value).unwrap();
    state.execute_command(set, false).unwrap();
    let remove = NodeCommand::remove_property(state.root(), id("div"), "class").unwrap();
    state.execute_command(remove, false).unwrap();

    let class = |state: &DocumentState| {
        state.document().find(&id("div")).unwrap().property("class").cloned()
    };
    assert_eq!(class(&state), None);

    state.undo().unwrap();
    assert_eq!(class(&state), Some(PropertyValue::literal("changed")));
    state.undo().unwrap();
    assert_eq!(class(&state), Some(PropertyValue::literal("original")));
    state.undo().unwrap();
    assert_eq!(class(&state), None);
}

#[test]
fn test_generic_stack_over_plain_values() {
    #[derive(Debug, Clone)]
    struct Push(char);

    impl Command<String> for Push {
        fn execute(&self, state: &String) -> tessera_editor::CommandResult<String> {
            Ok(format!("{}{}", state, self.0))
        }

        fn undo(&self, state: &String) -> tessera_editor::CommandResult<String> {
            let mut next = state.clone();
            match next.pop() {
                Some(c) if c == self.0 => Ok(next),
                _ => Err(tessera_editor::CommandError::StateDrift(state.clone())),
            }
        }

        fn description(&self) -> String {
            format!("Push {}", self.0)
        }
    }

    let mut stack = UndoStack::new(HistoryConfig::default());
    let mut text = String::new();
    for c in "abc".chars() {
        text = stack.execute(Push(c), &text, true).unwrap().state;
    }
    assert_eq!(text, "abc");
    assert_eq!(stack.undo_levels(), 3);

    // Undo against a state the command did not produce fails and keeps the entry
    assert!(stack.undo(&"xyz".to_string()).is_err());
    assert_eq!(stack.undo_levels(), 3);

    let text = stack.undo(&text).unwrap().unwrap();
    assert_eq!(text, "ab");
}

#[test]
fn test_document_integrity_after_complex_sequence() {
    let source = r#"{"entities": [
        {"id": "card", "type": "Panel", "children": [{"id": "title", "text": "Title"}]},
        {"id": "content", "text": "Content"}
    ]}"#;
    let mut state = state(source);
    let original = Arc::clone(state.root());

    let root = Arc::clone(state.root());
    let commands = vec![
        NodeCommand::set_property(&root, id("title"), "text", PropertyValue::literal("New Title"))
            .unwrap(),
        NodeCommand::move_element(&root, id("card"), serde_json::json!({"x": 10, "y": 4})).unwrap(),
        NodeCommand::rename(&root, id("content"), id("body")).unwrap(),
        NodeCommand::reorder(&root, id("content"), 0).unwrap(),
    ];
    for command in commands {
        // reorder was built before the rename; it addresses the element by id
        if let Err(e) = state.execute_command(command, false) {
            assert!(matches!(e, tessera_editor::CommandError::Tree(_)));
        }
    }
    assert_eq!(state.status().undo_depth, 3);

    // Serialized output is still a valid document
    let json = serde_json::json!({ "entities": entities_to_json(state.root()) });
    let bytes = serde_json::to_vec(&json).unwrap();
    let (reparsed, warnings) = Parser::default().parse(&bytes).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(reparsed.root().subtree_len(), state.root().subtree_len());
    assert!(reparsed.find(&id("body")).is_some());
    assert_eq!(
        reparsed.find(&id("title")).unwrap().property("text"),
        Some(&PropertyValue::literal("New Title"))
    );

    while state.undo().unwrap() {}
    assert_eq!(state.root(), &original);
}
