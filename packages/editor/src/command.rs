//! # Command protocol
//!
//! A command is an immutable description of one edit over some state `S`.
//! It can produce the next state, invert itself, and optionally fold an
//! earlier command of the same shape into a single undo step.

use std::fmt::Debug;
use tessera_syntax::TreeError;
use thiserror::Error;

/// Why a command could not apply; the input state is never modified
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Element must carry an id")]
    MissingId,

    #[error("State drift: {0}")]
    StateDrift(String),
}

pub type CommandResult<S> = Result<S, CommandError>;

/// Reversible edit over state `S`
///
/// `execute` and `undo` are pure: they read the given state and return a new
/// one, or an error leaving the caller's state as it was.
pub trait Command<S>: Clone + Debug {
    /// Apply the edit
    fn execute(&self, state: &S) -> CommandResult<S>;

    /// Revert the edit on a state produced by [`Command::execute`]
    fn undo(&self, state: &S) -> CommandResult<S>;

    /// Human-readable label for menus and history panels
    fn description(&self) -> String;

    /// Whether `self` (the newer command) can absorb `earlier`
    fn can_merge_with(&self, _earlier: &Self) -> bool {
        false
    }

    /// Single command equivalent to `earlier` followed by `self`
    ///
    /// Its `undo` must restore the state from before `earlier`.
    fn merge_with(&self, _earlier: &Self) -> Option<Self> {
        None
    }
}
