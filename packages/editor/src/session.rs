//! # Edit Session
//!
//! Ties one open file together:
//!
//! ```text
//!             edit/undo/redo
//!                   │
//!        ┌──────────┴──────────┐
//!        ▼                     ▼
//!  DocumentState          DeltaTracker ──apply_to──► raw Document
//!  (resolved view)        (edit intents)                 │
//!                                                  SpliceExporter
//!                                                        │
//!                                                      bytes ──► disk
//! ```
//!
//! The resolved tree is what the user edits and sees. The raw document is
//! the last parse of the bytes on disk; it only changes on save or reload.
//!
//! The undo stack and the delta log are kept in step by position: the bottom
//! `exported_depth` undo entries are already on disk. Undoing or redoing an
//! entry above that line retracts or re-records its own deltas; crossing
//! below it records (or retracts) the inverse, since the file now has to be
//! changed back.

use crate::cache::DocumentCache;
use crate::config::EditorConfig;
use crate::delta::{DeltaTracker, EditDelta, SkippedDelta};
use crate::document::{Applied, DocumentState};
use crate::errors::EditorResult;
use crate::export::SpliceExporter;
use crate::node_command::NodeCommand;
use crate::undo_stack::HistoryStatus;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_common::FileSystem;
use tessera_syntax::{Document, Node, NodeId, Parser};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct EditSession {
    path: PathBuf,
    state: DocumentState,
    raw: Document,
    tracker: DeltaTracker,
    exporter: SpliceExporter,
    parser: Parser,

    /// Undo entries (from the bottom) whose effect is already on disk
    exported_depth: usize,
}

impl EditSession {
    pub fn new(path: impl Into<PathBuf>, document: Document, config: &EditorConfig) -> Self {
        Self {
            path: path.into(),
            state: DocumentState::new(document.clone(), config.history_config()),
            raw: document,
            tracker: DeltaTracker::new(),
            exporter: config.exporter(),
            parser: config.parser(),
            exported_depth: 0,
        }
    }

    /// Open `path` through the cache
    pub fn open<F: FileSystem>(
        cache: &mut DocumentCache<F>,
        path: &Path,
        config: &EditorConfig,
    ) -> EditorResult<Self> {
        let document = cache.get_or_parse(path, &config.parser())?;
        info!(
            path = %path.display(),
            entities = document.root().children().len(),
            "Opened document"
        );
        Ok(Self::new(path, document, config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved document as currently edited
    pub fn document(&self) -> &Document {
        self.state.document()
    }

    pub fn root(&self) -> &Arc<Node> {
        self.state.root()
    }

    /// Document as last read from disk
    pub fn raw(&self) -> &Document {
        &self.raw
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn tracker(&self) -> &DeltaTracker {
        &self.tracker
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn has_changes(&self) -> bool {
        self.tracker.has_changes()
    }

    pub fn status(&self) -> HistoryStatus {
        self.state.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.state.subscribe()
    }

    fn undo_depth(&self) -> usize {
        self.state.history().undo_levels()
    }

    /// Execute a command and record its deltas
    pub fn edit(&mut self, command: NodeCommand, allow_merge: bool) -> EditorResult<Applied> {
        let depth = self.undo_depth();
        let deltas = command.to_delta();

        // Exported entries never absorb new edits
        let allow_merge = allow_merge && depth > self.exported_depth;
        let applied = self.state.execute_command(command, allow_merge)?;

        if applied.merged {
            for delta in deltas {
                if let Some((target, property)) = delta.property_key() {
                    self.tracker.remove_delta(target, property);
                }
                self.tracker.record(delta);
            }
        } else {
            self.commit(deltas, depth, applied.trimmed);
        }
        Ok(applied)
    }

    /// Show an in-progress edit without recording it
    pub fn preview(&mut self, root: Arc<Node>) {
        self.state.apply_preview(root);
    }

    /// Record the command for an edit already shown via [`Self::preview`]
    pub fn commit_preview(&mut self, command: NodeCommand) {
        let depth = self.undo_depth();
        let deltas = command.to_delta();
        let trimmed = self.state.push_without_execute(command);
        self.commit(deltas, depth, trimmed);
    }

    fn commit(&mut self, deltas: Vec<EditDelta>, depth: usize, trimmed: usize) {
        // Anything undone past the save point is gone from the redo stack now
        self.exported_depth = self.exported_depth.min(depth).saturating_sub(trimmed);
        for delta in deltas {
            self.tracker.record(delta);
        }
    }

    /// Undo the last edit; `Ok(false)` when there is nothing to undo
    pub fn undo(&mut self) -> EditorResult<bool> {
        let depth = self.undo_depth();
        let Some(command) = self.state.history().peek_undo().cloned() else {
            return Ok(false);
        };
        if !self.state.undo()? {
            return Ok(false);
        }

        if depth > self.exported_depth {
            self.retract(command.to_delta());
        } else {
            for delta in command.inverse().to_delta() {
                self.tracker.record(delta);
            }
        }
        Ok(true)
    }

    /// Redo the last undone edit; `Ok(false)` when there is nothing to redo
    pub fn redo(&mut self) -> EditorResult<bool> {
        let depth = self.undo_depth();
        let Some(command) = self.state.history().peek_redo().cloned() else {
            return Ok(false);
        };
        if !self.state.redo()? {
            return Ok(false);
        }

        if depth < self.exported_depth {
            self.retract(command.inverse().to_delta());
        } else {
            for delta in command.to_delta() {
                self.tracker.record(delta);
            }
        }
        Ok(true)
    }

    /// Take back previously recorded deltas, newest first
    fn retract(&mut self, deltas: Vec<EditDelta>) {
        for delta in deltas.iter().rev() {
            let removed = match delta.property_key() {
                Some((target, property)) => self.tracker.remove_delta(target, property),
                None => match structural_id(delta) {
                    Some(id) => self.tracker.remove_structural_delta(id),
                    None => None,
                },
            };
            if removed.is_none() {
                debug!(?delta, "No recorded delta to retract");
            }
        }
    }

    /// Bytes to write, or `None` when nothing changed since the last save
    pub fn render(&self) -> EditorResult<Option<Vec<u8>>> {
        Ok(self.reconcile()?.map(|(bytes, _)| bytes))
    }

    fn reconcile(&self) -> EditorResult<Option<(Vec<u8>, Vec<SkippedDelta>)>> {
        if !self.tracker.has_changes() {
            return Ok(None);
        }
        let reconciled = self.tracker.apply_to(&self.raw)?;
        let bytes = self.exporter.export(&reconciled.document)?;
        Ok(Some((bytes, reconciled.skipped)))
    }

    /// Write pending changes; returns whether the file was written
    ///
    /// Deltas that could not be applied to the file stay pending and the
    /// session stays dirty, since the file does not show them.
    pub fn save<F: FileSystem>(&mut self, cache: &mut DocumentCache<F>) -> EditorResult<bool> {
        let Some((bytes, skipped)) = self.reconcile()? else {
            self.state.mark_saved();
            self.exported_depth = self.undo_depth();
            return Ok(false);
        };

        // Parse before writing so a bad render never reaches disk
        let (raw, _) = self.parser.parse(&bytes)?;
        cache.fs().write(&self.path, &bytes)?;
        cache.put(&self.path, raw.clone());
        info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            deltas = self.tracker.len(),
            "Saved document"
        );
        self.raw = raw;
        self.exported_depth = self.undo_depth();

        if skipped.is_empty() {
            self.tracker.clear();
            self.state.mark_saved();
        } else {
            warn!(
                path = %self.path.display(),
                pending = skipped.len(),
                "Saved without edits that do not apply to the file"
            );
            self.tracker.retain(|delta| skipped.iter().any(|s| &s.delta == delta));
        }
        Ok(true)
    }

    /// Re-read the file after an external change, discarding history
    pub fn reload<F: FileSystem>(&mut self, cache: &mut DocumentCache<F>) -> EditorResult<()> {
        cache.invalidate(&self.path);
        let document = cache.get_or_parse(&self.path, &self.parser)?;
        self.state.replace_document(document.clone());
        self.raw = document;
        self.tracker.clear();
        self.exported_depth = 0;
        info!(path = %self.path.display(), "Reloaded document");
        Ok(())
    }
}

fn structural_id(delta: &EditDelta) -> Option<&NodeId> {
    match delta {
        EditDelta::AddElement { element, .. } => element.id(),
        EditDelta::DeleteElement { target } => Some(target),
        EditDelta::RenameElement { new_id, .. } => Some(new_id),
        EditDelta::ReorderElement { element, .. } => Some(element),
        _ => None,
    }
}
