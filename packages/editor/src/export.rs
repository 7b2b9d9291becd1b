//! # Byte-splice export
//!
//! Writes a document back by replacing only the bytes of the entity array.
//! Everything outside that range (formatting, comments in metadata values,
//! key order, trailing newline) is copied through untouched.
//!
//! ```text
//! raw:    {"a": 1,   "entities": [ ...old... ]  }
//!                                 ^start      ^end
//! output: {"a": 1,   "entities": [...new...]  }
//! ```
//!
//! When the file has no entity array yet, the field is inserted before the
//! final `}`; when there is no object to insert into, a fresh one is
//! synthesized from the metadata.

use serde_json::Value;
use tessera_syntax::prefab::{entities_to_json, ENTITIES_FIELD};
use tessera_syntax::{ByteRange, Document};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Range {start}..{end} does not fit a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Failed to serialize entities: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Serialize(e.to_string())
    }
}

/// How the output buffer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceStrategy {
    /// The recorded range was replaced in place
    Replaced,

    /// The field was missing and was inserted before the closing brace
    Inserted,

    /// No enclosing object; a new one was written
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct Exported {
    pub bytes: Vec<u8>,
    pub strategy: SpliceStrategy,
}

#[derive(Debug, Clone)]
pub struct SpliceExporter {
    field: String,
}

impl Default for SpliceExporter {
    fn default() -> Self {
        Self::new(ENTITIES_FIELD)
    }
}

impl SpliceExporter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn export(&self, document: &Document) -> Result<Vec<u8>, ExportError> {
        Ok(self.export_detailed(document)?.bytes)
    }

    pub fn export_detailed(&self, document: &Document) -> Result<Exported, ExportError> {
        let body = serde_json::to_vec(&entities_to_json(document.root()))?;
        let raw = document.raw();

        let exported = match document.range(&self.field) {
            Some(range) => Exported {
                bytes: replace(raw, range, &body)?,
                strategy: SpliceStrategy::Replaced,
            },
            None => match insert_field(raw, &self.field, &body)? {
                Some(bytes) => Exported {
                    bytes,
                    strategy: SpliceStrategy::Inserted,
                },
                None => Exported {
                    bytes: synthesize(document, &self.field, &body)?,
                    strategy: SpliceStrategy::Synthesized,
                },
            },
        };

        debug!(
            strategy = ?exported.strategy,
            raw = raw.len(),
            out = exported.bytes.len(),
            "Exported document"
        );
        Ok(exported)
    }
}

fn replace(raw: &[u8], range: ByteRange, body: &[u8]) -> Result<Vec<u8>, ExportError> {
    if !range.fits(raw.len()) {
        return Err(ExportError::InvalidRange {
            start: range.start,
            end: range.end,
            len: raw.len(),
        });
    }
    let mut out = Vec::with_capacity(raw.len() - range.len() + body.len());
    out.extend_from_slice(&raw[..range.start]);
    out.extend_from_slice(body);
    out.extend_from_slice(&raw[range.end..]);
    Ok(out)
}

/// Insert `"field":body` before the last `}`; `None` when there is none
fn insert_field(raw: &[u8], field: &str, body: &[u8]) -> Result<Option<Vec<u8>>, ExportError> {
    let Some(close) = raw.iter().rposition(|b| !b.is_ascii_whitespace()) else {
        return Ok(None);
    };
    if raw[close] != b'}' {
        return Ok(None);
    }

    // Insert right after the last content byte so the file's own spacing
    // before the brace is kept
    let content_end = raw[..close]
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0);
    let needs_comma = content_end > 0 && !matches!(raw[content_end - 1], b'{' | b',');

    let key = serde_json::to_vec(field)?;
    let mut out = Vec::with_capacity(raw.len() + key.len() + body.len() + 2);
    out.extend_from_slice(&raw[..content_end]);
    if needs_comma {
        out.push(b',');
    }
    out.extend_from_slice(&key);
    out.push(b':');
    out.extend_from_slice(body);
    out.extend_from_slice(&raw[content_end..]);
    Ok(Some(out))
}

fn synthesize(document: &Document, field: &str, body: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut out = vec![b'{'];
    for (key, value) in document.metadata() {
        if key == field {
            continue;
        }
        out.extend_from_slice(&serde_json::to_vec(key)?);
        out.push(b':');
        out.extend_from_slice(&serde_json::to_vec::<Value>(value)?);
        out.push(b',');
    }
    out.extend_from_slice(&serde_json::to_vec(field)?);
    out.push(b':');
    out.extend_from_slice(body);
    out.push(b'}');
    Ok(out)
}
