use crate::error::{CommonError, CommonResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Cheap proxy for file content identity: byte length plus last-modified time.
///
/// Two fingerprints compare equal only when both fields match. A file that
/// cannot be stat'ed fingerprints as [`Fingerprint::MISSING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint {
    /// File size in bytes
    pub len: u64,

    /// Last-modified time in nanoseconds since the Unix epoch (0 if unknown)
    pub modified: u128,
}

impl Fingerprint {
    /// Fingerprint of a file that is absent or could not be stat'ed
    pub const MISSING: Fingerprint = Fingerprint { len: 0, modified: 0 };

    pub fn new(len: u64, modified: u128) -> Self {
        Self { len, modified }
    }

    pub fn is_missing(&self) -> bool {
        *self == Self::MISSING
    }
}

/// File system abstraction for path resolution, file access and testing
pub trait FileSystem {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Canonicalize a path (resolve symlinks, make absolute)
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;

    /// Read the whole file
    fn read(&self, path: &Path) -> CommonResult<Vec<u8>>;

    /// Replace the file's contents with `bytes`
    fn write(&self, path: &Path, bytes: &[u8]) -> CommonResult<()>;

    /// Stat the file
    fn stat(&self, path: &Path) -> CommonResult<Fingerprint>;

    /// Stat the file, mapping any failure to [`Fingerprint::MISSING`]
    fn fingerprint(&self, path: &Path) -> Fingerprint {
        self.stat(path).unwrap_or(Fingerprint::MISSING)
    }
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        std::fs::canonicalize(path)
    }

    fn read(&self, path: &Path) -> CommonResult<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    /// Writes to a sibling temp file first, then renames over the target so a
    /// reader never observes a half-written file.
    fn write(&self, path: &Path, bytes: &[u8]) -> CommonResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tessera-tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn stat(&self, path: &Path) -> CommonResult<Fingerprint> {
        let meta = std::fs::metadata(path)?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Ok(Fingerprint::new(meta.len(), modified))
    }
}

#[derive(Debug, Clone)]
struct MockFile {
    bytes: Vec<u8>,
    modified: u128,
}

/// Mock file system for testing
///
/// Every write bumps a logical clock that stands in for the last-modified
/// time, so rewriting a file always changes its fingerprint.
pub struct MockFileSystem {
    files: RefCell<HashMap<PathBuf, MockFile>>,
    clock: RefCell<u128>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: RefCell::new(HashMap::new()),
            clock: RefCell::new(0),
        }
    }

    fn tick(&self) -> u128 {
        let mut clock = self.clock.borrow_mut();
        *clock += 1;
        *clock
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        let modified = self.tick();
        self.files.borrow_mut().insert(
            path.into(),
            MockFile {
                bytes: bytes.into(),
                modified,
            },
        );
    }

    /// Bump the last-modified time without changing the contents
    pub fn touch(&self, path: &Path) {
        let modified = self.tick();
        if let Some(file) = self.files.borrow_mut().get_mut(path) {
            file.modified = modified;
        }
    }

    /// Overwrite the contents while keeping the last-modified time
    pub fn set_contents_keep_mtime(&self, path: &Path, bytes: impl Into<Vec<u8>>) {
        if let Some(file) = self.files.borrow_mut().get_mut(path) {
            file.bytes = bytes.into();
        }
    }

    pub fn remove(&self, path: &Path) {
        self.files.borrow_mut().remove(path);
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).map(|f| f.bytes.clone())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        // For mock, just return the path as-is
        Ok(path.to_path_buf())
    }

    fn read(&self, path: &Path) -> CommonResult<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| CommonError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> CommonResult<()> {
        self.add_file(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn stat(&self, path: &Path) -> CommonResult<Fingerprint> {
        self.files
            .borrow()
            .get(path)
            .map(|f| Fingerprint::new(f.bytes.len() as u64, f.modified))
            .ok_or_else(|| CommonError::NotFound(path.to_path_buf()))
    }
}
