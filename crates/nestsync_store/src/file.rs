//! File-based store for persistent slots.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A file-backed slot store.
///
/// Each key maps to one file inside the store directory; slot data survives
/// process restarts.
///
/// # Durability
///
/// `set` writes to a temporary file in the same directory, flushes it, and
/// renames it over the slot file, so a crash mid-write leaves the previous
/// slot value intact.
///
/// # Keys
///
/// Keys become file names, so they must be non-empty and must not contain
/// path separators or `..`. The engine's fixed keys (`sync.queue`,
/// `sync.last_synced_at`) satisfy this.
///
/// # Example
///
/// ```no_run
/// use nestsync_store::{FileStore, StoreBackend};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("/var/lib/nestsync")).unwrap();
/// store.set("sync.queue", b"[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a file store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "keys must be plain file names".into(),
            });
        }
        Ok(self.dir.join(key))
    }
}

impl StoreBackend for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.slot_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.slot_path(key)?;
        let tmp = self.dir.join(format!("{key}.tmp"));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value)?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.get("sync.queue").unwrap().is_none());
    }

    #[test]
    fn slots_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set("sync.queue", b"[{\"id\":\"x\"}]").unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("sync.queue").unwrap(),
            Some(b"[{\"id\":\"x\"}]".to_vec())
        );
    }

    #[test]
    fn set_replaces_previous_value() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("slot", b"first").unwrap();
        store.set("slot", b"second").unwrap();
        assert_eq!(store.get("slot").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for key in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.set(key, b"x"),
                Err(StoreError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn opens_nested_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("state").join("sync");
        let store = FileStore::open(&nested).unwrap();
        store.set("slot", b"v").unwrap();
        assert!(nested.join("slot").exists());
    }
}
