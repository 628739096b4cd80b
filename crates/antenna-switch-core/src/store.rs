//! Persistence of the active antenna index.
//!
//! The selection is kept as a decimal string in a single text file
//! (`ant` by default). [`FileStore`] reads and overwrites that file;
//! [`MemoryStore`] keeps the value in memory and counts writes, which
//! is what tests and simulations use.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Default file name of the persisted selection.
pub const DEFAULT_STATE_FILE: &str = "ant";

/// Errors raised by a [`SelectionStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file exists but could not be read.
    #[error("failed to read selection from {path}: {source}")]
    Read {
        /// Path of the state file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The backing file could not be written.
    #[error("failed to write selection to {path}: {source}")]
    Write {
        /// Path of the state file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Storage for the persisted selection.
///
/// Values are opaque strings: the store never validates what it holds.
/// A successful [`write`](Self::write) is visible to every later
/// [`read`](Self::read) in the same process.
pub trait SelectionStore: Send {
    /// Return the stored value, trimmed, or `None` if nothing is stored.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored value.
    fn write(&mut self, value: &str) -> Result<(), StoreError>;
}

/// A [`SelectionStore`] backed by a plain text file.
///
/// Writes overwrite the file in place. There is no fsync or
/// rename-into-place, so a crash mid-write can leave the file empty or
/// truncated; the selector treats such content as corrupt and heals it
/// on the next start.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for FileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        // Invalid UTF-8 is decoded lossily so it reaches the caller as an
        // unparseable value instead of a read error.
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).trim().to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&mut self, value: &str) -> Result<(), StoreError> {
        std::fs::write(&self.path, value).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    value: Option<String>,
    writes: usize,
}

/// An in-memory [`SelectionStore`].
///
/// Clones share the same value, so a caller can hand one clone to the
/// selector and keep another to inspect what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty store (the "first run" state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value`.
    pub fn with_value(value: &str) -> Self {
        let store = Self::new();
        store.lock().value = Some(value.to_owned());
        store
    }

    /// The currently stored value.
    pub fn value(&self) -> Option<String> {
        self.lock().value.clone()
    }

    /// How many writes have been performed through this store.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SelectionStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock().value.as_deref().map(|v| v.trim().to_owned()))
    }

    fn write(&mut self, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.value = Some(value.to_owned());
        inner.writes = inner.writes.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "antenna_switch_store_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        ));
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join(DEFAULT_STATE_FILE);
        std::fs::remove_file(&path).ok();
        path
    }

    #[test]
    fn missing_file_reads_as_none() {
        let store = FileStore::new(temp_state_path("missing"));
        assert!(matches!(store.read(), Ok(None)));
    }

    #[test]
    fn read_after_write_returns_written_value() {
        let mut store = FileStore::new(temp_state_path("roundtrip"));
        assert!(store.write("3").is_ok());
        assert_eq!(store.read().ok().flatten().as_deref(), Some("3"));

        assert!(store.write("1").is_ok());
        assert_eq!(store.read().ok().flatten().as_deref(), Some("1"));
    }

    #[test]
    fn read_trims_whitespace() {
        let path = temp_state_path("trim");
        std::fs::write(&path, "  2\n").ok();
        let store = FileStore::new(path);
        assert_eq!(store.read().ok().flatten().as_deref(), Some("2"));
    }

    #[test]
    fn content_is_not_validated() {
        let path = temp_state_path("garbage");
        std::fs::write(&path, "banana").ok();
        let store = FileStore::new(path);
        assert_eq!(store.read().ok().flatten().as_deref(), Some("banana"));
    }

    #[test]
    fn non_utf8_content_reads_as_garbage_not_error() {
        let path = temp_state_path("binary");
        std::fs::write(&path, [0xff, 0xfe, b'3']).ok();
        let store = FileStore::new(path);
        let value = store.read().ok().flatten();
        assert!(value.is_some());
        assert_ne!(value.as_deref(), Some("3"));
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let path = temp_state_path("nodir").join("no_such_dir").join("ant");
        let mut store = FileStore::new(path);
        assert!(matches!(store.write("1"), Err(StoreError::Write { .. })));
    }

    #[test]
    fn memory_store_clones_share_state() {
        let observer = MemoryStore::new();
        let mut handle = observer.clone();
        assert!(handle.write("4").is_ok());
        assert_eq!(observer.value().as_deref(), Some("4"));
        assert_eq!(observer.write_count(), 1);
    }
}
