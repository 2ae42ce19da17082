//! Key-value persistence with file locking.
//!
//! Each owner reads and writes its own key through [`KeyValueStore`]. The
//! on-disk [`FileStore`] keeps every key in one JSON object and rewrites it
//! atomically, so a crash mid-write never leaves a half-written document.
//!
//! Because all keys share one document, every write is a read-modify-write
//! cycle. It runs under an exclusive lock on a sidecar `<file>.lock` so that
//! writers in other threads or processes cannot drop each other's keys.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Key holding the serialized [`UserProfile`](crate::UserProfile)
pub const PROFILE_KEY: &str = "dailystride_profile";

/// Key holding today's step count as a decimal integer
pub const TODAY_STEPS_KEY: &str = "dailystride_today_steps";

/// String-keyed store whose values are text
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON-document store with shared/exclusive locking
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    // One read-modify-write at a time within this process
    writer: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the given file. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self {
            path,
            lock_path,
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (creating if needed) the sidecar file the locks are taken on
    fn open_lock_file(&self) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Read the whole document under a shared lock.
    ///
    /// A missing file is empty. An unreadable or corrupted file logs a warning
    /// and is also treated as empty.
    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let lock = match self.open_lock_file() {
            Ok(lock) => lock,
            Err(e) => {
                // Read-only directory
                tracing::warn!("Unable to open {:?}: {}. Reading unlocked.", self.lock_path, e);
                return Ok(self.read_document());
            }
        };
        if let Err(e) = lock.lock_shared() {
            tracing::warn!(
                "Unable to lock store {:?}: {}. Treating as empty.",
                self.lock_path,
                e
            );
            return Ok(BTreeMap::new());
        }

        let map = self.read_document();
        lock.unlock()?;
        Ok(map)
    }

    /// Parse the document. Callers hold a lock on the sidecar.
    fn read_document(&self) -> BTreeMap<String, String> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    "Unable to open store file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                return BTreeMap::new();
            }
        };

        let mut contents = String::new();
        if let Err(e) = file.read_to_string(&mut contents) {
            tracing::warn!(
                "Failed to read store file {:?}: {}. Treating as empty.",
                self.path,
                e
            );
            return BTreeMap::new();
        }

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse store file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                BTreeMap::new()
            }
        }
    }

    /// Atomically replace the whole document by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the old document
    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Storage(format!("{:?} has no parent directory", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Load, modify and save the document while holding the exclusive lock
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| Error::Storage("store writer lock poisoned".into()))?;

        let lock = self.open_lock_file()?;
        lock.lock_exclusive()?;

        let result = {
            let mut map = self.read_document();
            f(&mut map);
            self.write_all(&map)
        };

        lock.unlock()?;
        result
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(".lock");
    path.with_file_name(name)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!("Stored {} in {:?}", key, self.path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })?;
        tracing::debug!("Removed {} from {:?}", key, self.path);
        Ok(())
    }
}

/// In-memory store for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("store.json"));

        store.set(TODAY_STEPS_KEY, "1500").unwrap();
        store.set(PROFILE_KEY, "{}").unwrap();
        assert_eq!(store.get(TODAY_STEPS_KEY).unwrap(), Some("1500".into()));

        store.remove(TODAY_STEPS_KEY).unwrap();
        assert_eq!(store.get(TODAY_STEPS_KEY).unwrap(), None);
        // Other keys untouched
        assert_eq!(store.get(PROFILE_KEY).unwrap(), Some("{}".into()));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("nonexistent.json"));

        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);
        store.remove(PROFILE_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupted_file_reads_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);

        // Writing recovers the file
        store.set(TODAY_STEPS_KEY, "42").unwrap();
        assert_eq!(store.get(TODAY_STEPS_KEY).unwrap(), Some("42".into()));
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("store.json");
        let store = FileStore::new(&path);

        store.set(TODAY_STEPS_KEY, "7").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("store.json"));

        for i in 0..5 {
            store.set(TODAY_STEPS_KEY, &i.to_string()).unwrap();
        }

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "store.json" && e.file_name() != "store.json.lock")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only store.json and its lock, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_concurrent_writers_keep_every_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(temp_dir.path().join("store.json")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        store.set(&format!("writer_{}", t), &i.to_string()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..8 {
            assert_eq!(
                store.get(&format!("writer_{}", t)).unwrap(),
                Some("24".into()),
                "writer_{} lost its last write",
                t
            );
        }
    }

    #[test]
    fn test_separate_handles_share_the_lock() {
        // Two stores on one file behave like two processes
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        let a = FileStore::new(&path);
        let b = FileStore::new(&path);

        thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..50 {
                    a.set(TODAY_STEPS_KEY, &i.to_string()).unwrap();
                }
            });
            scope.spawn(|| {
                for i in 0..50 {
                    b.set(PROFILE_KEY, &format!("profile {}", i)).unwrap();
                }
            });
        });

        let fresh = FileStore::new(&path);
        assert_eq!(fresh.get(TODAY_STEPS_KEY).unwrap(), Some("49".into()));
        assert_eq!(fresh.get(PROFILE_KEY).unwrap(), Some("profile 49".into()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);
        store.set(PROFILE_KEY, "x").unwrap();
        assert_eq!(store.get(PROFILE_KEY).unwrap(), Some("x".into()));
        store.remove(PROFILE_KEY).unwrap();
        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);
    }
}
