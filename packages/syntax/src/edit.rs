//! # Persistent tree edits
//!
//! Every operation takes the current root and returns a new root. Only the
//! nodes on the path from the root to the edited node are copied; all other
//! subtrees are shared with the input by `Arc`. An operation that cannot
//! apply returns a [`TreeError`] and the input tree is untouched.

use crate::ast::{Node, NodeId, PropertyValue};
use crate::error::TreeError;
use std::sync::Arc;

/// Where a node sits in its parent; `parent == None` means the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub parent: Option<NodeId>,
    pub index: usize,
}

/// A node taken out of the tree together with where it was
#[derive(Debug, Clone)]
pub struct Removed {
    pub location: Location,
    pub node: Arc<Node>,
}

impl Node {
    /// Depth-first search for the node with `id`
    pub fn find<'a>(self: &'a Arc<Self>, id: &NodeId) -> Option<&'a Arc<Node>> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn contains(self: &Arc<Self>, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Child indices leading from `self` to `id`; empty when `self` matches
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<usize>> {
        if self.id() == Some(id) {
            return Some(Vec::new());
        }
        for (i, child) in self.children().iter().enumerate() {
            if let Some(mut path) = child.path_to(id) {
                path.insert(0, i);
                return Some(path);
            }
        }
        None
    }

    pub fn locate(self: &Arc<Self>, id: &NodeId) -> Result<Location, TreeError> {
        let path = self
            .path_to(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        let (&index, parent_path) = path
            .split_last()
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;

        if parent_path.is_empty() {
            return Ok(Location { parent: None, index });
        }

        let parent = self.node_at(parent_path);
        match parent.id() {
            Some(parent_id) => Ok(Location {
                parent: Some(parent_id.clone()),
                index,
            }),
            None => Err(TreeError::AnonymousParent(id.clone())),
        }
    }

    fn node_at(&self, path: &[usize]) -> &Node {
        path.iter().fold(self, |node, &i| &node.children()[i])
    }

    fn parent_path(&self, parent: Option<&NodeId>) -> Result<Vec<usize>, TreeError> {
        match parent {
            None => Ok(Vec::new()),
            Some(id) => self
                .path_to(id)
                .ok_or_else(|| TreeError::ParentNotFound(id.clone())),
        }
    }

    /// Rebuild the path to `path`, applying `edit` to a copy of the target
    fn rebuild<F>(self: &Arc<Self>, path: &[usize], edit: F) -> Result<Arc<Node>, TreeError>
    where
        F: FnOnce(&mut Node) -> Result<(), TreeError>,
    {
        match path.split_first() {
            None => {
                let mut next = (**self).clone();
                edit(&mut next)?;
                Ok(Arc::new(next))
            }
            Some((&i, rest)) => {
                let child = self.children()[i].rebuild(rest, edit)?;
                let mut next = (**self).clone();
                next.children_mut()[i] = child;
                Ok(Arc::new(next))
            }
        }
    }

    /// Set (or overwrite) a property, replacing any reference in that slot
    pub fn set_property(
        self: &Arc<Self>,
        id: &NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<Arc<Node>, TreeError> {
        let path = self
            .path_to(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        self.rebuild(&path, |node| {
            node.properties_mut().insert(name.to_string(), value);
            Ok(())
        })
    }

    pub fn remove_property(
        self: &Arc<Self>,
        id: &NodeId,
        name: &str,
    ) -> Result<Arc<Node>, TreeError> {
        let path = self
            .path_to(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        self.rebuild(&path, |node| {
            node.properties_mut()
                .shift_remove(name)
                .map(|_| ())
                .ok_or_else(|| TreeError::PropertyNotFound {
                    id: id.clone(),
                    name: name.to_string(),
                })
        })
    }

    /// Insert `child` under `parent` (the root when `None`) at `index`
    pub fn insert_child(
        self: &Arc<Self>,
        parent: Option<&NodeId>,
        index: usize,
        child: Arc<Node>,
    ) -> Result<Arc<Node>, TreeError> {
        if let Some(dup) = child.ids().into_iter().find(|id| self.contains(id)) {
            return Err(TreeError::DuplicateId(dup.clone()));
        }
        let path = self.parent_path(parent)?;
        self.rebuild(&path, |node| {
            let len = node.children().len();
            if index > len {
                return Err(TreeError::IndexOutOfRange { index, len });
            }
            node.children_mut().insert(index, child);
            Ok(())
        })
    }

    /// Remove the node with `id` and its whole subtree
    pub fn remove_node(self: &Arc<Self>, id: &NodeId) -> Result<(Arc<Node>, Removed), TreeError> {
        let location = self.locate(id)?;
        let path = self.parent_path(location.parent.as_ref())?;
        let mut taken = None;
        let root = self.rebuild(&path, |node| {
            taken = Some(node.children_mut().remove(location.index));
            Ok(())
        })?;
        let node = taken.ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        Ok((root, Removed { location, node }))
    }

    pub fn rename(self: &Arc<Self>, old: &NodeId, new: &NodeId) -> Result<Arc<Node>, TreeError> {
        if old != new && self.contains(new) {
            return Err(TreeError::DuplicateId(new.clone()));
        }
        let path = self
            .path_to(old)
            .ok_or_else(|| TreeError::NodeNotFound(old.clone()))?;
        self.rebuild(&path, |node| {
            node.set_id(new.clone());
            Ok(())
        })
    }

    /// Move the child at `from` to `to` within the same parent
    pub fn reorder(
        self: &Arc<Self>,
        parent: Option<&NodeId>,
        from: usize,
        to: usize,
    ) -> Result<Arc<Node>, TreeError> {
        let path = self.parent_path(parent)?;
        self.rebuild(&path, |node| {
            let len = node.children().len();
            for index in [from, to] {
                if index >= len {
                    return Err(TreeError::IndexOutOfRange { index, len });
                }
            }
            let child = node.children_mut().remove(from);
            node.children_mut().insert(to, child);
            Ok(())
        })
    }
}
