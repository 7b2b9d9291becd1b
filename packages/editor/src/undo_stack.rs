//! # Undo/Redo Stack
//!
//! Generic history engine over any state type `S` and command type
//! `C: Command<S>`.
//!
//! ## Design
//!
//! - Commands are pure: the stack never owns the state, it is handed the
//!   current state and returns the next one
//! - New commands clear the redo stack
//! - A command arriving within the merge window of the top entry may be
//!   folded into it, so a slider drag is a single undo step
//! - A failed undo or redo puts the entry back where it was
//! - The dirty flag compares the undo depth with the depth recorded at the
//!   last save, not the content
//!
//! Status is republished on a `tokio::sync::watch` channel after every
//! change so a UI can bind to it without polling.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new(HistoryConfig::default());
//! let next = stack.execute(command, &state, true)?.state;
//! let prev = stack.undo(&next)?;
//! ```

use crate::command::{Command, CommandError};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Default maximum number of undo levels
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default merge window
pub const DEFAULT_MERGE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undo levels (0 = unlimited)
    pub max_depth: usize,

    /// Commands closer together than this may merge
    pub merge_window: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            merge_window: DEFAULT_MERGE_WINDOW,
        }
    }
}

/// Snapshot of what a history panel or menu needs to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
    pub dirty: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Result of a successful [`UndoStack::execute`]
#[derive(Debug, Clone)]
pub struct Executed<S> {
    pub state: S,

    /// The command was folded into the previous entry
    pub merged: bool,

    /// Oldest entries dropped to stay within `max_depth`
    pub trimmed: usize,
}

#[derive(Debug, Clone)]
struct CommandEntry<C> {
    command: C,
    executed_at: Instant,
}

/// Undo/redo stack for one document
#[derive(Debug)]
pub struct UndoStack<S, C: Command<S>> {
    /// Applied commands (most recent last)
    undo_stack: VecDeque<CommandEntry<C>>,

    /// Undone commands (most recent last)
    redo_stack: Vec<C>,

    config: HistoryConfig,

    /// Undo depth at the last save
    saved_len: usize,

    /// Set after undo/redo so the next command starts a fresh entry
    merge_barrier: bool,

    status: watch::Sender<HistoryStatus>,

    _state: PhantomData<fn(&S) -> S>,
}

impl<S, C: Command<S>> UndoStack<S, C> {
    pub fn new(config: HistoryConfig) -> Self {
        let (status, _) = watch::channel(HistoryStatus::default());
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            config,
            saved_len: 0,
            merge_barrier: false,
            status,
            _state: PhantomData,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Execute a command and record it for undo
    ///
    /// On error nothing is recorded and the caller keeps its state.
    pub fn execute(
        &mut self,
        command: C,
        state: &S,
        allow_merge: bool,
    ) -> Result<Executed<S>, CommandError> {
        self.execute_at(command, state, allow_merge, Instant::now())
    }

    /// [`UndoStack::execute`] with an explicit clock reading
    pub fn execute_at(
        &mut self,
        command: C,
        state: &S,
        allow_merge: bool,
        now: Instant,
    ) -> Result<Executed<S>, CommandError> {
        let next = command.execute(state)?;

        if allow_merge && !self.merge_barrier {
            if let Some(merged) = self.try_merge(&command, now) {
                debug!(command = %merged.description(), "Merged into previous undo entry");
                if let Some(top) = self.undo_stack.back_mut() {
                    top.command = merged;
                    top.executed_at = now;
                }
                self.redo_stack.clear();
                self.publish();
                return Ok(Executed {
                    state: next,
                    merged: true,
                    trimmed: 0,
                });
            }
        }

        debug!(command = %command.description(), "Recording undo entry");
        let trimmed = self.push_entry(command, now);
        self.merge_barrier = false;
        self.publish();
        Ok(Executed {
            state: next,
            merged: false,
            trimmed,
        })
    }

    fn try_merge(&self, command: &C, now: Instant) -> Option<C> {
        let top = self.undo_stack.back()?;
        if now.saturating_duration_since(top.executed_at) > self.config.merge_window {
            return None;
        }
        if !command.can_merge_with(&top.command) {
            return None;
        }
        command.merge_with(&top.command)
    }

    /// Push an entry, clear redo and trim; returns how many entries were dropped
    fn push_entry(&mut self, command: C, now: Instant) -> usize {
        self.undo_stack.push_back(CommandEntry {
            command,
            executed_at: now,
        });
        self.redo_stack.clear();

        let mut trimmed = 0;
        while self.config.max_depth > 0 && self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.pop_front();
            trimmed += 1;
        }
        trimmed
    }

    /// Record a command whose effect was already applied out-of-band
    ///
    /// Used when a live drag has been previewing the edit; the command is
    /// never executed and never merges.
    pub fn push_without_execute(&mut self, command: C) -> usize {
        self.push_without_execute_at(command, Instant::now())
    }

    pub fn push_without_execute_at(&mut self, command: C, now: Instant) -> usize {
        let trimmed = self.push_entry(command, now);
        self.merge_barrier = true;
        self.publish();
        trimmed
    }

    /// Undo the most recent command
    ///
    /// `Ok(None)` when there is nothing to undo. On error the entry stays on
    /// the undo stack.
    pub fn undo(&mut self, state: &S) -> Result<Option<S>, CommandError> {
        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(None);
        };

        match entry.command.undo(state) {
            Ok(prev) => {
                self.redo_stack.push(entry.command);
                self.merge_barrier = true;
                self.publish();
                Ok(Some(prev))
            }
            Err(e) => {
                warn!(command = %entry.command.description(), error = %e, "Undo failed");
                self.undo_stack.push_back(entry);
                Err(e)
            }
        }
    }

    /// Redo the most recently undone command
    pub fn redo(&mut self, state: &S) -> Result<Option<S>, CommandError> {
        self.redo_at(state, Instant::now())
    }

    pub fn redo_at(&mut self, state: &S, now: Instant) -> Result<Option<S>, CommandError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };

        match command.execute(state) {
            Ok(next) => {
                self.undo_stack.push_back(CommandEntry {
                    command,
                    executed_at: now,
                });
                self.merge_barrier = true;
                self.publish();
                Ok(Some(next))
            }
            Err(e) => {
                warn!(command = %command.description(), error = %e, "Redo failed");
                self.redo_stack.push(command);
                Err(e)
            }
        }
    }

    /// Command that the next undo would revert
    pub fn peek_undo(&self) -> Option<&C> {
        self.undo_stack.back().map(|entry| &entry.command)
    }

    /// Command that the next redo would reapply
    pub fn peek_redo(&self) -> Option<&C> {
        self.redo_stack.last()
    }

    /// Record the current depth as the save point
    pub fn mark_saved(&mut self) {
        self.saved_len = self.undo_stack.len();
        self.publish();
    }

    /// Clear all undo/redo history; the current state becomes the save point
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.saved_len = 0;
        self.merge_barrier = false;
        self.publish();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.undo_stack.len() != self.saved_len
    }

    pub fn undo_description(&self) -> Option<String> {
        self.peek_undo().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.peek_redo().map(|c| c.description())
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_description: self.undo_description(),
            redo_description: self.redo_description(),
            dirty: self.is_dirty(),
            undo_depth: self.undo_levels(),
            redo_depth: self.redo_levels(),
        }
    }

    /// Receiver that sees every status change
    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.status.subscribe()
    }

    fn publish(&self) {
        self.status.send_replace(self.status());
    }
}

impl<S, C: Command<S>> Default for UndoStack<S, C> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}
