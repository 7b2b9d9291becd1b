//! # Tessera Editor
//!
//! Editing engine for structured prefab documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ syntax: bytes → Document (+ byte ranges)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - Command / UndoStack: generic history     │
//! │  - DocumentState: one per open document     │
//! │  - DeltaTracker: edit intents for export    │
//! │  - DocumentCache: LRU by file fingerprint   │
//! │  - SpliceExporter: rewrite only what changed│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ bytes on disk (formatting outside the       │
//! │ entity array untouched)                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Trees are immutable**: every edit produces a new root sharing all
//!    untouched subtrees
//! 2. **Commands are pure**: the undo stack never owns the state it edits
//! 3. **Intents, not diffs**: export replays what the user meant onto the
//!    tree that was read from disk
//! 4. **Never write a clean file**: no recorded change, no write
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_editor::{DocumentCache, EditSession, EditorConfig, NodeCommand};
//!
//! let config = EditorConfig::default();
//! let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
//! let mut session = EditSession::open(&mut cache, path, &config)?;
//!
//! let command = NodeCommand::set_property(session.root(), id, "hp", value)?;
//! session.edit(command, true)?;
//! session.undo()?;
//! session.save(&mut cache)?;
//! ```

mod cache;
mod command;
mod config;
mod delta;
mod document;
mod errors;
mod export;
mod node_command;
mod session;
mod undo_stack;

pub use cache::{CacheStats, DocumentCache, DEFAULT_CACHE_CAPACITY};
pub use command::{Command, CommandError, CommandResult};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use delta::{
    DeltaTracker, EditDelta, ReconcileError, Reconciliation, SkippedDelta, POSITION_PROPERTY,
};
pub use document::{Applied, DocumentState};
pub use errors::{EditorError, EditorResult};
pub use export::{ExportError, Exported, SpliceExporter, SpliceStrategy};
pub use node_command::NodeCommand;
pub use session::EditSession;
pub use undo_stack::{
    Executed, HistoryConfig, HistoryStatus, UndoStack, DEFAULT_MAX_DEPTH, DEFAULT_MERGE_WINDOW,
};

// Re-export common types for convenience
pub use tessera_syntax::{Document, Node, NodeId, PropertyValue};
