//! Error types for the editor

use crate::command::CommandError;
use crate::delta::ReconcileError;
use crate::export::ExportError;
use tessera_common::CommonError;
use tessera_syntax::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("File system error: {0}")]
    FileSystem(#[from] CommonError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Invalid config: {0}")]
    Config(String),
}

pub type EditorResult<T> = Result<T, EditorError>;
