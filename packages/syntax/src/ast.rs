use crate::error::TreeError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a node, unique within one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create an id, rejecting blank (empty or whitespace-only) strings
    pub fn new(id: impl Into<String>) -> Result<Self, TreeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TreeError::BlankId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NodeId::new(value)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = TreeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        NodeId::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Value held in a node's property slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    /// Plain value written directly in the source
    Literal(serde_json::Value),

    /// Indirect binding to a named style or asset
    Reference(String),
}

impl PropertyValue {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        PropertyValue::Literal(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        PropertyValue::Reference(name.into())
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyValue::Reference(_))
    }
}

/// Half-open byte span `[start, end)` into a document's raw buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the span lies inside a buffer of `buffer_len` bytes
    pub fn fits(&self, buffer_len: usize) -> bool {
        self.start <= self.end && self.end <= buffer_len
    }
}

/// Immutable tree element
///
/// Children are shared behind `Arc`, so an edit only rebuilds the nodes on
/// the path from the edited node up to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: String,
    id: Option<NodeId>,
    properties: IndexMap<String, PropertyValue>,
    children: Vec<Arc<Node>>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            properties: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Arc<Node>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Arc<Node>>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.id.as_ref()
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    pub(crate) fn properties_mut(&mut self) -> &mut IndexMap<String, PropertyValue> {
        &mut self.properties
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Arc<Node>> {
        &mut self.children
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }

    /// All ids in this subtree, depth-first
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a NodeId>) {
        if let Some(id) = &self.id {
            out.push(id);
        }
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

/// Immutable parsed document
///
/// Cloning is cheap: every field is reference counted. Edits go through
/// [`Document::with_root`], which keeps the raw buffer and byte ranges of
/// the original parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Arc<Node>,
    metadata: Arc<IndexMap<String, serde_json::Value>>,
    raw: Arc<[u8]>,
    ranges: Arc<HashMap<String, ByteRange>>,
}

impl Document {
    pub fn new(
        root: impl Into<Arc<Node>>,
        metadata: IndexMap<String, serde_json::Value>,
        raw: impl Into<Arc<[u8]>>,
        ranges: HashMap<String, ByteRange>,
    ) -> Self {
        Self {
            root: root.into(),
            metadata: Arc::new(metadata),
            raw: raw.into(),
            ranges: Arc::new(ranges),
        }
    }

    /// Document with no backing bytes, e.g. built in memory
    pub fn from_root(root: impl Into<Arc<Node>>) -> Self {
        Self::new(root, IndexMap::new(), Vec::new(), HashMap::new())
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn metadata(&self) -> &IndexMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn ranges(&self) -> &HashMap<String, ByteRange> {
        &self.ranges
    }

    pub fn range(&self, name: &str) -> Option<ByteRange> {
        self.ranges.get(name).copied()
    }

    /// New generation of this document with a different tree
    pub fn with_root(&self, root: Arc<Node>) -> Self {
        Self {
            root,
            metadata: Arc::clone(&self.metadata),
            raw: Arc::clone(&self.raw),
            ranges: Arc::clone(&self.ranges),
        }
    }

    pub fn find(&self, id: &NodeId) -> Option<&Arc<Node>> {
        self.root.find(id)
    }
}
