//! # Tessera Syntax
//!
//! Immutable document model shared by the editor, plus the reference parser
//! for prefab JSON files.
//!
//! - [`ast`]: `Document`, `Node`, `NodeId`, `PropertyValue`, `ByteRange`
//! - [`edit`]: persistent structural edits (path copying, `Arc` sharing)
//! - [`lexer`]: logos tokenizer and top-level byte-range scanner
//! - [`prefab`]: `parse` and the entity serializer used on export

pub mod ast;
pub mod edit;
pub mod error;
pub mod lexer;
pub mod prefab;

pub use ast::{ByteRange, Document, Node, NodeId, PropertyValue};
pub use edit::{Location, Removed};
pub use error::{ParseError, ParseResult, ParseWarning, TreeError};
pub use lexer::{tokenize, top_level_ranges, Token};
pub use prefab::{entities_to_json, parse, to_json, Parser};
