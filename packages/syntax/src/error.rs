//! Error types for the Tessera document model and parser

use crate::ast::NodeId;
use std::ops::Range;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal parse error; the caller gets no document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid UTF-8 at byte {pos}")]
    InvalidUtf8 { pos: usize },

    #[error("Lexer error at {span:?}")]
    LexError { span: Range<usize> },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl ParseError {
    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn pos(&self) -> Option<usize> {
        match self {
            ParseError::InvalidUtf8 { pos } | ParseError::InvalidSyntax { pos, .. } => Some(*pos),
            ParseError::LexError { span } => Some(span.start),
            ParseError::Json(_) => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::Json(e.to_string())
    }
}

/// Recoverable oddity found while parsing; the document is still produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("{path}: blank id ignored")]
    BlankId { path: String },

    #[error("{path}: duplicate id {id} ignored")]
    DuplicateId { path: String, id: NodeId },

    #[error("{path}: id must be a string or integer")]
    UnsupportedId { path: String },
}

/// Structural edit that cannot be applied to a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node id must not be blank")]
    BlankId,

    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("Property {name} not found on {id}")]
    PropertyNotFound { id: NodeId, name: String },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Parent of {0} has no id and cannot be addressed")]
    AnonymousParent(NodeId),
}
