pub mod add;
pub mod init;
pub mod inspect;
pub mod set;

pub use add::{add, AddArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use set::{set, SetArgs};

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tessera_common::RealFileSystem;
use tessera_editor::{DocumentCache, EditSession, EditorConfig};
use tracing::debug;

/// Open `file` for editing through a fresh cache
pub(crate) fn open(
    file: &Path,
    config: &EditorConfig,
) -> Result<(DocumentCache<RealFileSystem>, EditSession)> {
    debug!(path = %file.display(), field = %config.splice_field, "Opening session");
    let mut cache = DocumentCache::new(RealFileSystem, config.cache_capacity);
    let session = EditSession::open(&mut cache, file, config)?;
    Ok((cache, session))
}

/// Save and report what happened
pub(crate) fn save(
    cache: &mut DocumentCache<RealFileSystem>,
    session: &mut EditSession,
) -> Result<()> {
    if session.save(cache)? {
        println!("  {} Saved {}", "✓".green(), session.path().display());
    } else {
        println!("  {} No changes to {}", "·".dimmed(), session.path().display());
    }
    Ok(())
}
