//! # Node commands
//!
//! Closed set of edits over a document tree. Constructors read the current
//! root to capture whatever the inverse needs (the old value, the removed
//! subtree and where it sat), so a command is self-contained once built.

use crate::command::{Command, CommandError, CommandResult};
use crate::delta::{EditDelta, POSITION_PROPERTY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_syntax::{Node, NodeId, PropertyValue, TreeError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeCommand {
    SetProperty {
        target: NodeId,
        name: String,
        old: Option<PropertyValue>,
        new: PropertyValue,
    },
    RemoveProperty {
        target: NodeId,
        name: String,
        old: PropertyValue,
    },
    AddElement {
        parent: Option<NodeId>,
        index: usize,
        element: Arc<Node>,
    },
    DeleteElement {
        parent: Option<NodeId>,
        index: usize,
        element: Arc<Node>,
    },
    MoveElement {
        target: NodeId,
        old: Option<PropertyValue>,
        new: serde_json::Value,
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
    Batch {
        description: String,
        commands: Vec<NodeCommand>,
    },
}

fn target_node<'a>(root: &'a Arc<Node>, id: &NodeId) -> Result<&'a Arc<Node>, TreeError> {
    root.find(id).ok_or_else(|| TreeError::NodeNotFound(id.clone()))
}

impl NodeCommand {
    pub fn set_property(
        root: &Arc<Node>,
        target: NodeId,
        name: impl Into<String>,
        new: PropertyValue,
    ) -> Result<Self, CommandError> {
        let name = name.into();
        let old = target_node(root, &target)?.property(&name).cloned();
        Ok(NodeCommand::SetProperty {
            target,
            name,
            old,
            new,
        })
    }

    pub fn remove_property(
        root: &Arc<Node>,
        target: NodeId,
        name: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let name = name.into();
        let old = target_node(root, &target)?
            .property(&name)
            .cloned()
            .ok_or_else(|| TreeError::PropertyNotFound {
                id: target.clone(),
                name: name.clone(),
            })?;
        Ok(NodeCommand::RemoveProperty { target, name, old })
    }

    /// New elements must carry an id so later edits can address them
    pub fn add_element(
        parent: Option<NodeId>,
        index: usize,
        element: impl Into<Arc<Node>>,
    ) -> Result<Self, CommandError> {
        let element = element.into();
        if element.id().is_none() {
            return Err(CommandError::MissingId);
        }
        Ok(NodeCommand::AddElement {
            parent,
            index,
            element,
        })
    }

    pub fn delete_element(root: &Arc<Node>, target: &NodeId) -> Result<Self, CommandError> {
        let location = root.locate(target)?;
        let element = Arc::clone(target_node(root, target)?);
        Ok(NodeCommand::DeleteElement {
            parent: location.parent,
            index: location.index,
            element,
        })
    }

    pub fn move_element(
        root: &Arc<Node>,
        target: NodeId,
        position: serde_json::Value,
    ) -> Result<Self, CommandError> {
        let old = target_node(root, &target)?
            .property(POSITION_PROPERTY)
            .cloned();
        Ok(NodeCommand::MoveElement {
            target,
            old,
            new: position,
        })
    }

    pub fn rename(root: &Arc<Node>, old_id: NodeId, new_id: NodeId) -> Result<Self, CommandError> {
        target_node(root, &old_id)?;
        Ok(NodeCommand::RenameElement { old_id, new_id })
    }

    /// Move `element` to index `to` among its siblings
    pub fn reorder(root: &Arc<Node>, element: NodeId, to: usize) -> Result<Self, CommandError> {
        let location = root.locate(&element)?;
        Ok(NodeCommand::ReorderElement {
            parent: location.parent,
            element,
            from: location.index,
            to,
        })
    }

    pub fn batch(description: impl Into<String>, commands: Vec<NodeCommand>) -> Self {
        NodeCommand::Batch {
            description: description.into(),
            commands,
        }
    }

    /// Command that reverts `self`
    pub fn inverse(&self) -> NodeCommand {
        match self {
            NodeCommand::SetProperty {
                target,
                name,
                old,
                new,
            } => match old {
                Some(old) => NodeCommand::SetProperty {
                    target: target.clone(),
                    name: name.clone(),
                    old: Some(new.clone()),
                    new: old.clone(),
                },
                None => NodeCommand::RemoveProperty {
                    target: target.clone(),
                    name: name.clone(),
                    old: new.clone(),
                },
            },
            NodeCommand::RemoveProperty { target, name, old } => NodeCommand::SetProperty {
                target: target.clone(),
                name: name.clone(),
                old: None,
                new: old.clone(),
            },
            NodeCommand::AddElement {
                parent,
                index,
                element,
            } => NodeCommand::DeleteElement {
                parent: parent.clone(),
                index: *index,
                element: Arc::clone(element),
            },
            NodeCommand::DeleteElement {
                parent,
                index,
                element,
            } => NodeCommand::AddElement {
                parent: parent.clone(),
                index: *index,
                element: Arc::clone(element),
            },
            NodeCommand::MoveElement { target, old, new } => {
                let current = PropertyValue::Literal(new.clone());
                match old {
                    Some(PropertyValue::Literal(value)) => NodeCommand::MoveElement {
                        target: target.clone(),
                        old: Some(current),
                        new: value.clone(),
                    },
                    Some(reference) => NodeCommand::SetProperty {
                        target: target.clone(),
                        name: POSITION_PROPERTY.to_string(),
                        old: Some(current),
                        new: reference.clone(),
                    },
                    None => NodeCommand::RemoveProperty {
                        target: target.clone(),
                        name: POSITION_PROPERTY.to_string(),
                        old: current,
                    },
                }
            }
            NodeCommand::RenameElement { old_id, new_id } => NodeCommand::RenameElement {
                old_id: new_id.clone(),
                new_id: old_id.clone(),
            },
            NodeCommand::ReorderElement {
                parent,
                element,
                from,
                to,
            } => NodeCommand::ReorderElement {
                parent: parent.clone(),
                element: element.clone(),
                from: *to,
                to: *from,
            },
            NodeCommand::Batch {
                description,
                commands,
            } => NodeCommand::Batch {
                description: description.clone(),
                commands: commands.iter().rev().map(NodeCommand::inverse).collect(),
            },
        }
    }

    /// Edit intents this command implies for the raw document
    pub fn to_delta(&self) -> Vec<EditDelta> {
        match self {
            NodeCommand::SetProperty {
                target, name, new, ..
            } => vec![EditDelta::SetProperty {
                target: target.clone(),
                name: name.clone(),
                value: new.clone(),
            }],
            NodeCommand::RemoveProperty { target, name, .. } => vec![EditDelta::RemoveProperty {
                target: target.clone(),
                name: name.clone(),
            }],
            NodeCommand::AddElement {
                parent,
                index,
                element,
            } => vec![EditDelta::AddElement {
                parent: parent.clone(),
                index: *index,
                element: Arc::clone(element),
            }],
            NodeCommand::DeleteElement { element, .. } => match element.id() {
                Some(id) => vec![EditDelta::DeleteElement { target: id.clone() }],
                None => Vec::new(),
            },
            NodeCommand::MoveElement { target, new, .. } => vec![EditDelta::MoveElement {
                target: target.clone(),
                position: new.clone(),
            }],
            NodeCommand::RenameElement { old_id, new_id } => vec![EditDelta::RenameElement {
                old_id: old_id.clone(),
                new_id: new_id.clone(),
            }],
            NodeCommand::ReorderElement {
                parent,
                element,
                from,
                to,
            } => vec![EditDelta::ReorderElement {
                parent: parent.clone(),
                element: element.clone(),
                from: *from,
                to: *to,
            }],
            NodeCommand::Batch { commands, .. } => {
                commands.iter().flat_map(NodeCommand::to_delta).collect()
            }
        }
    }
}

impl Command<Arc<Node>> for NodeCommand {
    fn execute(&self, root: &Arc<Node>) -> CommandResult<Arc<Node>> {
        let next = match self {
            NodeCommand::SetProperty {
                target, name, new, ..
            } => root.set_property(target, name, new.clone())?,
            NodeCommand::RemoveProperty { target, name, .. } => root.remove_property(target, name)?,
            NodeCommand::AddElement {
                parent,
                index,
                element,
            } => root.insert_child(parent.as_ref(), *index, Arc::clone(element))?,
            NodeCommand::DeleteElement {
                parent,
                index,
                element,
            } => {
                let id = element.id().ok_or(CommandError::MissingId)?;
                let location = root.locate(id)?;
                if location.parent.as_ref() != parent.as_ref() || location.index != *index {
                    return Err(CommandError::StateDrift(format!(
                        "{} is no longer at index {}",
                        id, index
                    )));
                }
                root.remove_node(id)?.0
            }
            NodeCommand::MoveElement { target, new, .. } => root.set_property(
                target,
                POSITION_PROPERTY,
                PropertyValue::Literal(new.clone()),
            )?,
            NodeCommand::RenameElement { old_id, new_id } => root.rename(old_id, new_id)?,
            NodeCommand::ReorderElement {
                parent,
                element,
                from,
                to,
            } => {
                let location = root.locate(element)?;
                if location.parent.as_ref() != parent.as_ref() || location.index != *from {
                    return Err(CommandError::StateDrift(format!(
                        "{} is no longer at index {}",
                        element, from
                    )));
                }
                root.reorder(parent.as_ref(), *from, *to)?
            }
            NodeCommand::Batch { commands, .. } => commands
                .iter()
                .try_fold(Arc::clone(root), |state, command| command.execute(&state))?,
        };
        Ok(next)
    }

    fn undo(&self, root: &Arc<Node>) -> CommandResult<Arc<Node>> {
        self.inverse().execute(root)
    }

    fn description(&self) -> String {
        match self {
            NodeCommand::SetProperty { target, name, .. } => format!("Set {} on {}", name, target),
            NodeCommand::RemoveProperty { target, name, .. } => {
                format!("Remove {} from {}", name, target)
            }
            NodeCommand::AddElement { element, .. } => match element.id() {
                Some(id) => format!("Add {} {}", element.kind(), id),
                None => format!("Add {}", element.kind()),
            },
            NodeCommand::DeleteElement { element, .. } => match element.id() {
                Some(id) => format!("Delete {} {}", element.kind(), id),
                None => format!("Delete {}", element.kind()),
            },
            NodeCommand::MoveElement { target, .. } => format!("Move {}", target),
            NodeCommand::RenameElement { old_id, new_id } => {
                format!("Rename {} to {}", old_id, new_id)
            }
            NodeCommand::ReorderElement { element, .. } => format!("Reorder {}", element),
            NodeCommand::Batch { description, .. } => description.clone(),
        }
    }

    fn can_merge_with(&self, earlier: &Self) -> bool {
        match (self, earlier) {
            (
                NodeCommand::SetProperty { target, name, .. },
                NodeCommand::SetProperty {
                    target: earlier_target,
                    name: earlier_name,
                    ..
                },
            ) => target == earlier_target && name == earlier_name,
            (
                NodeCommand::MoveElement { target, .. },
                NodeCommand::MoveElement {
                    target: earlier_target,
                    ..
                },
            ) => target == earlier_target,
            _ => false,
        }
    }

    fn merge_with(&self, earlier: &Self) -> Option<Self> {
        if !self.can_merge_with(earlier) {
            return None;
        }
        match (self, earlier) {
            (
                NodeCommand::SetProperty {
                    target, name, new, ..
                },
                NodeCommand::SetProperty { old, .. },
            ) => Some(NodeCommand::SetProperty {
                target: target.clone(),
                name: name.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            (
                NodeCommand::MoveElement { target, new, .. },
                NodeCommand::MoveElement { old, .. },
            ) => Some(NodeCommand::MoveElement {
                target: target.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            _ => None,
        }
    }
}
