//! # Document Cache
//!
//! Parsed documents keyed by canonical file path, bounded by an LRU policy.
//! Each entry remembers the [`Fingerprint`] the file had when it was cached;
//! a lookup whose current fingerprint differs (or whose file cannot be
//! stat'ed) purges the entry and reports a miss. Equal fingerprints are
//! trusted without looking at the content.

use crate::errors::EditorResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tessera_common::{FileSystem, Fingerprint};
use tessera_syntax::{Document, Parser};
use tracing::{debug, trace};

pub const DEFAULT_CACHE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,

    /// Entries pushed out by capacity
    pub evictions: u64,

    /// Entries dropped because the file changed on disk
    pub stale_purges: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Document,
    fingerprint: Fingerprint,
}

pub struct DocumentCache<F: FileSystem> {
    fs: F,
    entries: LruCache<PathBuf, CacheEntry>,
    stats: CacheStats,
}

impl<F: FileSystem> DocumentCache<F> {
    /// A capacity of 0 is treated as 1
    pub fn new(fs: F, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fs,
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn with_default_capacity(fs: F) -> Self {
        Self::new(fs, DEFAULT_CACHE_CAPACITY)
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Canonical cache key for `path`
    ///
    /// A file that no longer exists is keyed through its canonical directory,
    /// so it still matches the entry cached while it existed.
    fn key(&self, path: &Path) -> PathBuf {
        if let Ok(key) = self.fs.canonicalize(path) {
            return key;
        }
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        match (self.fs.canonicalize(dir), path.file_name()) {
            (Ok(dir), Some(name)) => dir.join(name),
            _ => path.to_path_buf(),
        }
    }

    /// Cached document for `path` if the file is unchanged since it was cached
    pub fn get(&mut self, path: &Path) -> Option<Document> {
        let key = self.key(path);
        let current = self.fs.fingerprint(&key);

        let fresh = match self.entries.get(&key) {
            None => {
                self.stats.misses += 1;
                trace!(path = %key.display(), "Document cache miss");
                return None;
            }
            Some(entry) => !current.is_missing() && entry.fingerprint == current,
        };

        if !fresh {
            self.entries.pop(&key);
            self.stats.misses += 1;
            self.stats.stale_purges += 1;
            debug!(path = %key.display(), "Purged stale document from cache");
            return None;
        }

        self.stats.hits += 1;
        self.entries.get(&key).map(|entry| entry.document.clone())
    }

    /// Cache `document` under the file's current fingerprint
    pub fn put(&mut self, path: &Path, document: Document) {
        let key = self.key(path);
        let fingerprint = self.fs.fingerprint(&key);
        self.insert(key, document, fingerprint);
    }

    fn insert(&mut self, key: PathBuf, document: Document, fingerprint: Fingerprint) {
        let entry = CacheEntry {
            document,
            fingerprint,
        };
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                self.stats.evictions += 1;
                debug!(path = %evicted.display(), "Evicted least recently used document");
            }
        }
    }

    /// Drop the entry for `path`; returns whether one was cached
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = self.key(path);
        self.entries.pop(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached document, or read and parse the file and cache the result
    ///
    /// The fingerprint is taken before reading, so a write racing with the
    /// read shows up as a stale entry on the next lookup.
    pub fn get_or_parse(&mut self, path: &Path, parser: &Parser) -> EditorResult<Document> {
        if let Some(document) = self.get(path) {
            return Ok(document);
        }

        let key = self.key(path);
        let fingerprint = self.fs.fingerprint(&key);
        let bytes = self.fs.read(&key)?;
        let (document, _warnings) = parser.parse(&bytes)?;
        self.insert(key, document.clone(), fingerprint);
        Ok(document)
    }
}
