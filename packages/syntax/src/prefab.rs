//! # Prefab JSON
//!
//! A prefab file is a JSON object. Top-level fields other than the entity
//! array are kept as document metadata; the entity array becomes the root's
//! children:
//!
//! ```json
//! {
//!   "version": 2,
//!   "entities": [
//!     { "id": 1, "type": "Sprite", "texture": {"$ref": "hero"},
//!       "children": [ { "id": 2, "type": "Collider" } ] }
//!   ]
//! }
//! ```
//!
//! Every top-level field gets a [`ByteRange`] so the exporter can splice a
//! rewritten entity array back into the untouched bytes around it.

use crate::ast::{Document, Node, NodeId, PropertyValue};
use crate::error::{ParseError, ParseResult, ParseWarning};
use crate::lexer::top_level_ranges;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const ENTITIES_FIELD: &str = "entities";
pub const ROOT_KIND: &str = "prefab";
pub const DEFAULT_KIND: &str = "entity";
pub const REF_KEY: &str = "$ref";

const ID_KEY: &str = "id";
const TYPE_KEY: &str = "type";
const CHILDREN_KEY: &str = "children";

/// Prefab parser, configurable by the name of the entity array field
#[derive(Debug, Clone)]
pub struct Parser {
    entities_field: String,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ENTITIES_FIELD)
    }
}

impl Parser {
    pub fn new(entities_field: impl Into<String>) -> Self {
        Self {
            entities_field: entities_field.into(),
        }
    }

    pub fn entities_field(&self) -> &str {
        &self.entities_field
    }

    pub fn parse(&self, bytes: &[u8]) -> ParseResult<(Document, Vec<ParseWarning>)> {
        let source = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8 {
            pos: e.valid_up_to(),
        })?;

        let value: Value = serde_json::from_str(source)?;
        let Value::Object(fields) = value else {
            return Err(ParseError::invalid_syntax(0, "top-level value must be an object"));
        };
        let ranges = top_level_ranges(source)?;

        let mut metadata = IndexMap::new();
        let mut children = Vec::new();
        let mut builder = TreeBuilder::default();

        for (key, value) in fields {
            if key != self.entities_field {
                metadata.insert(key, value);
                continue;
            }
            let Value::Array(entities) = value else {
                return Err(ParseError::invalid_syntax(
                    ranges.get(&key).map(|r| r.start).unwrap_or(0),
                    format!("`{}` must be an array", key),
                ));
            };
            for (i, entity) in entities.into_iter().enumerate() {
                let path = format!("{}[{}]", key, i);
                children.push(Arc::new(builder.entity(entity, &path)?));
            }
        }

        for warning in &builder.warnings {
            warn!(%warning, "Prefab parse warning");
        }
        debug!(
            entities = children.len(),
            ranges = ranges.len(),
            bytes = bytes.len(),
            "Parsed prefab"
        );

        let root = Node::new(ROOT_KIND).with_children(children);
        let document = Document::new(root, metadata, bytes.to_vec(), ranges);
        Ok((document, builder.warnings))
    }

    /// Build a single entity (with its children) from its JSON shape
    pub fn parse_entity(&self, value: Value) -> ParseResult<(Node, Vec<ParseWarning>)> {
        let mut builder = TreeBuilder::default();
        let node = builder.entity(value, "entity")?;
        Ok((node, builder.warnings))
    }
}

/// Parse prefab bytes with the default entity field
pub fn parse(bytes: &[u8]) -> ParseResult<(Document, Vec<ParseWarning>)> {
    Parser::default().parse(bytes)
}

#[derive(Default)]
struct TreeBuilder {
    seen: HashSet<NodeId>,
    warnings: Vec<ParseWarning>,
}

impl TreeBuilder {
    fn entity(&mut self, value: Value, path: &str) -> ParseResult<Node> {
        let Value::Object(mut fields) = value else {
            return Err(ParseError::invalid_syntax(0, format!("{} is not an object", path)));
        };

        // A `children` key that is not an array of objects stays a plain property
        let nested = matches!(
            fields.get(CHILDREN_KEY),
            Some(Value::Array(items)) if items.iter().all(Value::is_object)
        );
        let children = match nested.then(|| fields.shift_remove(CHILDREN_KEY)).flatten() {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let kind = match fields.get(TYPE_KEY) {
            Some(Value::String(kind)) => kind.clone(),
            _ => DEFAULT_KIND.to_string(),
        };
        let mut node = Node::new(kind);

        if let Some(raw_id) = fields.get(ID_KEY) {
            if let Some(id) = self.id(raw_id, path) {
                node = node.with_id(id);
            }
        }

        for (key, value) in fields {
            node = node.with_property(key, property_from_json(value));
        }

        for (i, child) in children.into_iter().enumerate() {
            let child_path = format!("{}.{}[{}]", path, CHILDREN_KEY, i);
            node = node.with_child(self.entity(child, &child_path)?);
        }

        Ok(node)
    }

    fn id(&mut self, raw: &Value, path: &str) -> Option<NodeId> {
        let text = match raw {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => {
                self.warnings.push(ParseWarning::UnsupportedId {
                    path: path.to_string(),
                });
                return None;
            }
        };

        let Ok(id) = NodeId::new(text) else {
            self.warnings.push(ParseWarning::BlankId {
                path: path.to_string(),
            });
            return None;
        };

        if !self.seen.insert(id.clone()) {
            self.warnings.push(ParseWarning::DuplicateId {
                path: path.to_string(),
                id,
            });
            return None;
        }
        Some(id)
    }
}

pub fn property_from_json(value: Value) -> PropertyValue {
    if let Value::Object(map) = &value {
        if map.len() == 1 {
            if let Some(Value::String(name)) = map.get(REF_KEY) {
                return PropertyValue::Reference(name.clone());
            }
        }
    }
    PropertyValue::Literal(value)
}

pub fn property_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Literal(value) => value.clone(),
        PropertyValue::Reference(name) => {
            let mut map = Map::new();
            map.insert(REF_KEY.to_string(), Value::String(name.clone()));
            Value::Object(map)
        }
    }
}

/// Render one entity back to its JSON shape
///
/// The node's id wins over a stale `id` property, so a renamed entity is
/// written under its new id. A numeric id stays numeric when it still
/// parses as an integer.
pub fn to_json(node: &Node) -> Value {
    let mut map = Map::new();

    if let Some(id) = node.id() {
        if !node.properties().contains_key(ID_KEY) {
            map.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        }
    }

    for (key, value) in node.properties() {
        let json = match (key.as_str(), node.id()) {
            (ID_KEY, Some(id)) => id_to_json(id, value),
            _ => property_to_json(value),
        };
        map.insert(key.clone(), json);
    }

    if !node.children().is_empty() {
        let children = node.children().iter().map(|c| to_json(c)).collect();
        map.insert(CHILDREN_KEY.to_string(), Value::Array(children));
    }

    Value::Object(map)
}

/// Render the root's children as the entity array
pub fn entities_to_json(root: &Node) -> Value {
    Value::Array(root.children().iter().map(|c| to_json(c)).collect())
}

fn id_to_json(id: &NodeId, previous: &PropertyValue) -> Value {
    if let PropertyValue::Literal(Value::Number(_)) = previous {
        if let Ok(n) = id.as_str().parse::<i64>() {
            return Value::from(n);
        }
        if let Ok(n) = id.as_str().parse::<u64>() {
            return Value::from(n);
        }
    }
    Value::String(id.to_string())
}
