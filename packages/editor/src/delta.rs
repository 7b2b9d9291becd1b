//! # Edit deltas
//!
//! The resolved tree (what the user sees) and the raw tree (what gets
//! written back) are edited independently. Every user edit is also recorded
//! here as an [`EditDelta`]: a statement of intent that does not depend on
//! tree shape. On export the log is replayed onto the raw tree.
//!
//! ## Reconciliation
//!
//! 1. **Structural phase**: add, delete, rename and reorder deltas are
//!    applied in recorded order, since a later delta may target an element
//!    an earlier one created or renamed.
//! 2. **Property phase**: property deltas are re-targeted through the renames
//!    recorded *after* them, then collapsed to the last write per
//!    `(id, property)` and applied. An explicit value replaces any reference
//!    in that slot. A delta whose element is deleted later is dropped, so a
//!    reused id never inherits edits made to the element it replaced.
//!
//! A delta that does not apply is skipped and reported; the raw document
//! passed in is never modified.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_syntax::{Document, Node, NodeId, PropertyValue, TreeError};
use thiserror::Error;
use tracing::{debug, warn};

/// Property that `MoveElement` deltas write to
pub const POSITION_PROPERTY: &str = "position";

/// One recorded edit intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditDelta {
    SetProperty {
        target: NodeId,
        name: String,
        value: PropertyValue,
    },
    RemoveProperty {
        target: NodeId,
        name: String,
    },
    AddElement {
        parent: Option<NodeId>,
        index: usize,
        element: Arc<Node>,
    },
    DeleteElement {
        target: NodeId,
    },
    MoveElement {
        target: NodeId,
        position: serde_json::Value,
    },
    RenameElement {
        old_id: NodeId,
        new_id: NodeId,
    },
    ReorderElement {
        parent: Option<NodeId>,
        element: NodeId,
        from: usize,
        to: usize,
    },
}

impl EditDelta {
    pub fn is_structural(&self) -> bool {
        self.property_key().is_none()
    }

    /// `(target, property)` for property-level deltas
    pub fn property_key(&self) -> Option<(&NodeId, &str)> {
        match self {
            EditDelta::SetProperty { target, name, .. }
            | EditDelta::RemoveProperty { target, name } => Some((target, name.as_str())),
            EditDelta::MoveElement { target, .. } => Some((target, POSITION_PROPERTY)),
            _ => None,
        }
    }

    /// Whether a structural delta is about the element `id`
    pub fn concerns(&self, id: &NodeId) -> bool {
        match self {
            EditDelta::AddElement { element, .. } => element.id() == Some(id),
            EditDelta::DeleteElement { target } => target == id,
            EditDelta::RenameElement { old_id, new_id } => old_id == id || new_id == id,
            EditDelta::ReorderElement { element, .. } => element == id,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("None of the {} recorded edits could be applied", skipped.len())]
    NothingApplied { skipped: Vec<SkippedDelta> },
}

/// A delta that did not apply during reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDelta {
    pub delta: EditDelta,
    pub error: TreeError,
}

/// Outcome of [`DeltaTracker::apply_to`]
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub document: Document,
    pub applied: usize,
    pub skipped: Vec<SkippedDelta>,
}

/// Append-only log of edit intents awaiting export
#[derive(Debug, Clone, Default)]
pub struct DeltaTracker {
    deltas: Vec<EditDelta>,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, delta: EditDelta) {
        debug!(?delta, "Recording edit delta");
        self.deltas.push(delta);
    }

    /// Retract the most recent property delta for `(id, property)`
    pub fn remove_delta(&mut self, id: &NodeId, property: &str) -> Option<EditDelta> {
        let pos = self
            .deltas
            .iter()
            .rposition(|d| d.property_key() == Some((id, property)))?;
        Some(self.deltas.remove(pos))
    }

    /// Retract the most recent structural delta concerning `id`
    pub fn remove_structural_delta(&mut self, id: &NodeId) -> Option<EditDelta> {
        let pos = self
            .deltas
            .iter()
            .rposition(|d| d.is_structural() && d.concerns(id))?;
        Some(self.deltas.remove(pos))
    }

    pub fn has_changes(&self) -> bool {
        !self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn deltas(&self) -> &[EditDelta] {
        &self.deltas
    }

    pub fn clear(&mut self) {
        self.deltas.clear();
    }

    /// Keep only the deltas `keep` accepts, in recorded order
    pub fn retain(&mut self, keep: impl FnMut(&EditDelta) -> bool) {
        self.deltas.retain(keep);
    }

    /// Replay the log onto `raw`, returning the reconciled document
    pub fn apply_to(&self, raw: &Document) -> Result<Reconciliation, ReconcileError> {
        let mut root = Arc::clone(raw.root());
        let mut applied = 0;
        let mut skipped = Vec::new();

        // Renames and deletes that applied, in log order
        let mut lifecycle: Vec<(usize, Lifecycle<'_>)> = Vec::new();

        for (pos, delta) in self.deltas.iter().enumerate() {
            let result = match delta {
                EditDelta::AddElement {
                    parent,
                    index,
                    element,
                } => add_element(&root, parent.as_ref(), *index, element),
                EditDelta::DeleteElement { target } => {
                    root.remove_node(target).map(|(next, removed)| {
                        let ids = removed.node.ids().into_iter().cloned().collect();
                        lifecycle.push((pos, Lifecycle::Deleted(ids)));
                        next
                    })
                }
                EditDelta::RenameElement { old_id, new_id } => {
                    let result = root.rename(old_id, new_id);
                    if result.is_ok() {
                        lifecycle.push((pos, Lifecycle::Renamed(old_id, new_id)));
                    }
                    result
                }
                EditDelta::ReorderElement {
                    parent,
                    element,
                    from,
                    to,
                } => reorder_element(&root, parent.as_ref(), element, *from, *to),
                _ => continue,
            };
            match result {
                Ok(next) => {
                    root = next;
                    applied += 1;
                }
                Err(error) => skip(&mut skipped, delta, error),
            }
        }

        let mut collapsed: IndexMap<(NodeId, String), &EditDelta> = IndexMap::new();
        for (pos, delta) in self.deltas.iter().enumerate() {
            let Some((target, property)) = delta.property_key() else {
                continue;
            };
            // An element deleted later takes its edits with it, even if the
            // id is reused afterwards
            let Some(resolved) = resolve_target(&lifecycle, pos, target) else {
                debug!(?delta, "Dropping edit to an element deleted later");
                continue;
            };
            collapsed.insert((resolved.clone(), property.to_string()), delta);
        }

        for ((target, property), delta) in collapsed {
            let result = match delta {
                EditDelta::SetProperty { value, .. } => {
                    root.set_property(&target, &property, value.clone())
                }
                // Already absent in the raw tree counts as done
                EditDelta::RemoveProperty { .. } => match root.remove_property(&target, &property) {
                    Err(TreeError::PropertyNotFound { .. }) => Ok(Arc::clone(&root)),
                    result => result,
                },
                EditDelta::MoveElement { position, .. } => root.set_property(
                    &target,
                    POSITION_PROPERTY,
                    PropertyValue::Literal(position.clone()),
                ),
                _ => continue,
            };
            match result {
                Ok(next) => {
                    root = next;
                    applied += 1;
                }
                Err(error) => skip(&mut skipped, delta, error),
            }
        }

        if applied == 0 && !skipped.is_empty() {
            return Err(ReconcileError::NothingApplied { skipped });
        }

        debug!(applied, skipped = skipped.len(), "Reconciled edit deltas");
        Ok(Reconciliation {
            document: raw.with_root(root),
            applied,
            skipped,
        })
    }
}

enum Lifecycle<'a> {
    Renamed(&'a NodeId, &'a NodeId),
    /// Every id in the removed subtree
    Deleted(Vec<NodeId>),
}

/// Follow `target` through the renames and deletes recorded after `pos`
fn resolve_target<'a>(
    lifecycle: &'a [(usize, Lifecycle<'a>)],
    pos: usize,
    target: &'a NodeId,
) -> Option<&'a NodeId> {
    let mut id = target;
    for (_, event) in lifecycle.iter().filter(|(at, _)| *at > pos) {
        match event {
            Lifecycle::Renamed(old, new) if id == *old => id = *new,
            Lifecycle::Deleted(ids) if ids.contains(id) => return None,
            _ => {}
        }
    }
    Some(id)
}

fn skip(skipped: &mut Vec<SkippedDelta>, delta: &EditDelta, error: TreeError) {
    warn!(?delta, %error, "Skipping edit delta that does not apply");
    skipped.push(SkippedDelta {
        delta: delta.clone(),
        error,
    });
}

/// Insert, clamping the index to the raw parent's child count
fn add_element(
    root: &Arc<Node>,
    parent: Option<&NodeId>,
    index: usize,
    element: &Arc<Node>,
) -> Result<Arc<Node>, TreeError> {
    let len = match parent {
        None => root.children().len(),
        Some(id) => root
            .find(id)
            .ok_or_else(|| TreeError::ParentNotFound(id.clone()))?
            .children()
            .len(),
    };
    root.insert_child(parent, index.min(len), Arc::clone(element))
}

/// Reorder by element identity; `from` is only a hint
fn reorder_element(
    root: &Arc<Node>,
    parent: Option<&NodeId>,
    element: &NodeId,
    from: usize,
    to: usize,
) -> Result<Arc<Node>, TreeError> {
    let location = root.locate(element)?;
    if location.parent.as_ref() != parent {
        return Err(TreeError::NodeNotFound(element.clone()));
    }
    if location.index != from {
        debug!(%element, from, actual = location.index, "Reorder source index drifted");
    }
    let len = match parent {
        None => root.children().len(),
        Some(id) => root.find(id).map(|p| p.children().len()).unwrap_or(0),
    };
    let to = to.min(len.saturating_sub(1));
    root.reorder(parent, location.index, to)
}
