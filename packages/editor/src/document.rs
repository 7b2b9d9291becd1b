//! # Document State
//!
//! One `DocumentState` per open document. It owns the current immutable
//! [`Document`] and the undo history of its root node, and swaps in a new
//! document generation whenever a command, undo or redo succeeds.
//!
//! ## Lifecycle
//!
//! ```text
//! Parse → DocumentState::new → execute/undo/redo → mark_saved
//!                   ↑                                  │
//!                   └──── replace_document (reload) ◄──┘
//! ```
//!
//! States never share history; two open documents are two independent
//! containers.

use crate::command::CommandError;
use crate::node_command::NodeCommand;
use crate::undo_stack::{Executed, HistoryConfig, HistoryStatus, UndoStack};
use std::sync::Arc;
use tessera_syntax::{Document, Node};
use tokio::sync::watch;
use tracing::debug;

/// Editable document with its own undo history
#[derive(Debug)]
pub struct DocumentState {
    document: Document,
    history: UndoStack<Arc<Node>, NodeCommand>,

    /// Increments on every successful change to the document
    pub version: u64,
}

/// Outcome of [`DocumentState::execute_command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub version: u64,
    pub merged: bool,
    pub trimmed: usize,
}

impl DocumentState {
    pub fn new(document: Document, config: HistoryConfig) -> Self {
        Self {
            document,
            history: UndoStack::new(config),
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> &Arc<Node> {
        self.document.root()
    }

    pub fn history(&self) -> &UndoStack<Arc<Node>, NodeCommand> {
        &self.history
    }

    /// Run a command; on error the document is unchanged
    pub fn execute_command(
        &mut self,
        command: NodeCommand,
        allow_merge: bool,
    ) -> Result<Applied, CommandError> {
        let Executed {
            state,
            merged,
            trimmed,
        } = self
            .history
            .execute(command, self.document.root(), allow_merge)?;
        self.replace_root(state);
        Ok(Applied {
            version: self.version,
            merged,
            trimmed,
        })
    }

    /// Undo the last command; `Ok(false)` when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        match self.history.undo(self.document.root())? {
            Some(root) => {
                self.replace_root(root);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the last undone command; `Ok(false)` when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        match self.history.redo(self.document.root())? {
            Some(root) => {
                self.replace_root(root);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show an out-of-band edit (e.g. a live drag) without recording it
    pub fn apply_preview(&mut self, root: Arc<Node>) {
        self.replace_root(root);
    }

    /// Record the command for an edit already shown via [`Self::apply_preview`]
    pub fn push_without_execute(&mut self, command: NodeCommand) -> usize {
        self.history.push_without_execute(command)
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    /// Swap in a freshly loaded document, discarding all history
    pub fn replace_document(&mut self, document: Document) {
        debug!(version = self.version, "Replacing document, history cleared");
        self.document = document;
        self.version += 1;
        self.history.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn status(&self) -> HistoryStatus {
        self.history.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.history.subscribe()
    }

    fn replace_root(&mut self, root: Arc<Node>) {
        self.document = self.document.with_root(root);
        self.version += 1;
    }
}
