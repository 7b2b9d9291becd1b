//! Integration tests for the editor crate against the real file system

use std::path::Path;
use tessera_common::{FileSystem, RealFileSystem};
use tessera_editor::{
    DocumentCache, EditSession, EditorConfig, EditorError, Node, NodeCommand, NodeId,
    PropertyValue, ReconcileError,
};

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_document_lifecycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let source = concat!(
        "{\n  \"name\": \"Level 1\",\n",
        "  \"entities\": [\n    {\"id\": 0, \"type\": \"Spawn\"}\n  ],\n",
        "  \"footer\": true\n}\n"
    );
    let path = write(dir.path(), "level.json", source);

    let config = EditorConfig::default();
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let mut session = EditSession::open(&mut cache, &path, &config)?;

    // Check initial state
    assert!(!session.is_dirty());
    assert_eq!(session.render()?, None);

    let add = NodeCommand::add_element(
        None,
        1,
        Node::new("Enemy")
            .with_id(id("1"))
            .with_property("id", PropertyValue::literal(1))
            .with_property("type", PropertyValue::literal("Enemy")),
    )?;
    session.edit(add, false)?;
    assert!(session.is_dirty());

    assert!(session.save(&mut cache)?);
    assert_eq!(
        std::fs::read_to_string(&path)?,
        concat!(
            "{\n  \"name\": \"Level 1\",\n",
            "  \"entities\": [{\"id\":0,\"type\":\"Spawn\"},{\"id\":1,\"type\":\"Enemy\"}],\n",
            "  \"footer\": true\n}\n"
        )
    );
    assert!(!session.is_dirty());

    // Saving again with nothing pending does not touch the file
    let before = RealFileSystem.fingerprint(&path);
    assert!(!session.save(&mut cache)?);
    assert_eq!(RealFileSystem.fingerprint(&path), before);
    Ok(())
}

#[test]
fn test_cache_serves_unchanged_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "a.json", r#"{"entities": []}"#);
    let config = EditorConfig::default();
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);

    EditSession::open(&mut cache, &path, &config)?;
    EditSession::open(&mut cache, &path, &config)?;
    assert_eq!(cache.stats().hits, 1);

    // A different length is always noticed, whatever the mtime granularity
    std::fs::write(&path, r#"{"entities": [{"id": "x"}]}"#)?;
    let session = EditSession::open(&mut cache, &path, &config)?;
    assert_eq!(session.root().children().len(), 1);
    assert_eq!(cache.stats().stale_purges, 1);
    Ok(())
}

#[test]
fn test_large_document_splice() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let entities: Vec<String> = (0..50_000)
        .map(|i| format!(r#"{{"id":{},"hp":{}}}"#, i, i % 7))
        .collect();
    let source = format!(
        "{{ \"version\" : 9 ,\n\"entities\":[{}],\n\"tail\" : \"kept  as is\" }}",
        entities.join(",")
    );
    let path = write(dir.path(), "big.json", &source);

    let config = EditorConfig::default();
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let mut session = EditSession::open(&mut cache, &path, &config)?;

    let command = NodeCommand::set_property(
        session.root(),
        id("49999"),
        "hp",
        PropertyValue::literal(100),
    )?;
    session.edit(command, false)?;
    session.save(&mut cache)?;

    let written = std::fs::read_to_string(&path)?;
    assert!(written.starts_with("{ \"version\" : 9 ,\n\"entities\":[{\"id\":0,\"hp\":0},"));
    assert!(written.ends_with("{\"id\":49999,\"hp\":100}],\n\"tail\" : \"kept  as is\" }"));
    assert_eq!(written.len(), source.len() + 2);
    Ok(())
}

#[test]
fn test_external_edit_and_reload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "p.json", r#"{"entities": [{"id": "a"}]}"#);
    let config = EditorConfig::default();
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let mut session = EditSession::open(&mut cache, &path, &config)?;

    let delete = NodeCommand::delete_element(session.root(), &id("a"))?;
    session.edit(delete, false)?;

    // Someone else rewrites the file; the pending delete now targets nothing
    std::fs::write(&path, r#"{"entities": [{"id": "b"}]}"#)?;
    session.reload(&mut cache)?;
    assert!(session.document().find(&id("b")).is_some());
    assert_eq!(session.render()?, None);
    Ok(())
}

#[test]
fn test_unapplicable_deltas_are_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "p.json", r#"{"entities": [{"id": "a"}]}"#);
    let config = EditorConfig::default();
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let mut session = EditSession::open(&mut cache, &path, &config)?;

    let rename = NodeCommand::rename(session.root(), id("a"), id("b"))?;
    session.edit(rename, false)?;

    // A session over an unrelated raw document cannot apply the rename
    let (other, _) = tessera_syntax::parse(br#"{"entities": [{"id": "z"}]}"#)?;
    let err = session.tracker().apply_to(&other).unwrap_err();
    assert!(matches!(err, ReconcileError::NothingApplied { ref skipped } if skipped.len() == 1));

    let err: EditorError = err.into();
    assert!(err.to_string().contains("could be applied"));
    Ok(())
}

#[test]
fn test_config_drives_session() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(
        dir.path(),
        tessera_editor::DEFAULT_CONFIG_NAME,
        r#"{"spliceField": "nodes", "maxUndoDepth": 2}"#,
    );
    let path = write(dir.path(), "p.json", r#"{"nodes": [{"id": "a"}]}"#);

    let config = EditorConfig::load(dir.path())?;
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let mut session = EditSession::open(&mut cache, &path, &config)?;

    for hp in 0..4 {
        let command =
            NodeCommand::set_property(session.root(), id("a"), "hp", PropertyValue::literal(hp))?;
        session.edit(command, false)?;
    }
    assert_eq!(session.status().undo_depth, 2);

    session.save(&mut cache)?;
    assert_eq!(std::fs::read_to_string(&path)?, r#"{"nodes": [{"id":"a","hp":3}]}"#);
    Ok(())
}
