//! Build counter persisted in a JSON file.
//!
//! Every increment runs under an exclusive advisory lock on a sibling `.lock` file and
//! replaces the document through a temp file and an atomic rename, so concurrent builds
//! sharing the file (or the same key) never receive the same number.

use super::BuildCounterStore;
use super::lock::CounterLock;
use crate::config::CounterSettings;
use crate::error::{Result, StorageError};
use crate::version::CounterKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current version of the counter file format
pub const COUNTER_FORMAT_VERSION: u32 = 1;

/// On-disk counter document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDocument {
    /// Version of the file format
    pub format_version: u32,
    /// Last issued value per key
    pub counters: BTreeMap<CounterKey, CounterRecord>,
}

impl Default for CounterDocument {
    fn default() -> Self {
        Self {
            format_version: COUNTER_FORMAT_VERSION,
            counters: BTreeMap::new(),
        }
    }
}

/// Last issued build number for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Last value handed out
    pub value: u64,
    /// When it was handed out
    pub updated_at: DateTime<Utc>,
}

/// File-backed [`BuildCounterStore`]
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileCounterStore {
    /// Create a store for the counter file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let lock_path = sidecar(&path, "lock");
        Self {
            path,
            lock_path,
            lock_timeout: Duration::from_secs(10),
        }
    }

    /// Create a store from configuration
    pub fn from_settings(settings: &CounterSettings) -> Self {
        Self::new(&settings.path).with_lock_timeout(settings.lock_timeout)
    }

    /// Override how long `next` waits for the lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the counter document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file, `{path}.lock`
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// All persisted counters
    pub fn records(&self) -> Result<BTreeMap<CounterKey, CounterRecord>> {
        Ok(self.read_document()?.counters)
    }

    fn read_document(&self) -> Result<CounterDocument> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CounterDocument::default());
            }
            Err(e) => {
                return Err(StorageError::Unavailable {
                    path: self.path.clone(),
                    reason: format!("failed to read counter file: {}", e),
                }
                .into());
            }
        };

        let document: CounterDocument =
            serde_json::from_str(&contents).map_err(|e| StorageError::Corrupted {
                reason: format!("{}: {}", self.path.display(), e),
            })?;

        if document.format_version != COUNTER_FORMAT_VERSION {
            return Err(StorageError::Corrupted {
                reason: format!(
                    "{}: format version {} (expected {})",
                    self.path.display(),
                    document.format_version,
                    COUNTER_FORMAT_VERSION
                ),
            }
            .into());
        }

        Ok(document)
    }

    fn write_document(&self, document: &CounterDocument) -> Result<()> {
        let serialized =
            serde_json::to_string_pretty(document).map_err(|e| StorageError::WriteFailed {
                reason: format!("failed to serialize counters: {}", e),
            })?;

        let temp_path = sidecar(&self.path, "tmp");
        {
            let mut file = fs::File::create(&temp_path).map_err(|e| StorageError::WriteFailed {
                reason: format!("failed to create {}: {}", temp_path.display(), e),
            })?;
            file.write_all(serialized.as_bytes())
                .map_err(|e| StorageError::WriteFailed {
                    reason: format!("failed to write {}: {}", temp_path.display(), e),
                })?;
            file.sync_all().map_err(|e| StorageError::WriteFailed {
                reason: format!("failed to sync {}: {}", temp_path.display(), e),
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| StorageError::WriteFailed {
            reason: format!("failed to replace {}: {}", self.path.display(), e),
        })?;
        Ok(())
    }
}

/// `{path}.{suffix}`, keeping the document's own extension
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

impl BuildCounterStore for FileCounterStore {
    async fn next(&self, key: &CounterKey) -> Result<u64> {
        let _lock = CounterLock::acquire(&self.lock_path, self.lock_timeout).await?;

        let mut document = self.read_document()?;
        let now = Utc::now();
        let record = document
            .counters
            .entry(key.clone())
            .or_insert(CounterRecord {
                value: 0,
                updated_at: now,
            });
        record.value = record
            .value
            .checked_add(1)
            .ok_or_else(|| StorageError::Corrupted {
                reason: format!("counter for {} overflowed", key),
            })?;
        record.updated_at = now;
        let value = record.value;

        self.write_document(&document)?;
        log::debug!("Counter {} advanced to {} in {}", key, value, self.path.display());
        Ok(value)
    }

    async fn current(&self, key: &CounterKey) -> Result<Option<u64>> {
        // Writers replace the file by rename, so an unlocked read sees a whole document.
        Ok(self.read_document()?.counters.get(key).map(|r| r.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn key(s: &str) -> CounterKey {
        CounterKey::new(s)
    }

    #[tokio::test]
    async fn test_first_value_is_one_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        let store = FileCounterStore::new(&path);
        assert_eq!(store.current(&key("1.2.3-feature-x")).await.unwrap(), None);
        assert_eq!(store.next(&key("1.2.3-feature-x")).await.unwrap(), 1);

        // A fresh handle sees the persisted value
        let reopened = FileCounterStore::new(&path);
        assert_eq!(reopened.next(&key("1.2.3-feature-x")).await.unwrap(), 2);
        assert_eq!(reopened.current(&key("1.2.3-feature-x")).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_sequential_calls_strictly_increase_from_persisted_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        let store = FileCounterStore::new(&path);
        for _ in 0..3 {
            store.next(&key("0.6.0")).await.unwrap();
        }

        let mut issued = Vec::new();
        for _ in 0..10 {
            issued.push(store.next(&key("0.6.0")).await.unwrap());
        }
        assert_eq!(issued, (4..=13).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::new(dir.path().join("counters.json"));
        store.next(&key("1.0.0")).await.unwrap();
        store.next(&key("1.0.0")).await.unwrap();
        assert_eq!(store.next(&key("1.0.0-dev-branch")).await.unwrap(), 1);

        let records = store.records().unwrap();
        assert_eq!(records[&key("1.0.0")].value, 2);
        assert_eq!(records[&key("1.0.0-dev-branch")].value, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_share_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("counters.json"));
        let callers = 8;
        let calls_per_caller = 10;

        let mut handles = Vec::new();
        for _ in 0..callers {
            let path = Arc::clone(&path);
            handles.push(tokio::spawn(async move {
                // Separate handles behave like separate CI processes
                let store = FileCounterStore::new(path.as_path())
                    .with_lock_timeout(Duration::from_secs(60));
                let mut values = Vec::new();
                for _ in 0..calls_per_caller {
                    values.push(store.next(&CounterKey::new("2.0.0-feature-x")).await.unwrap());
                }
                values
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            let values = handle.await.unwrap();
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            all.extend(values);
        }

        let distinct: BTreeSet<u64> = all.iter().copied().collect();
        let total = (callers * calls_per_caller) as u64;
        assert_eq!(distinct.len() as u64, total);
        assert_eq!(distinct, (1..=total).collect::<BTreeSet<u64>>());

        let store = FileCounterStore::new(path.as_path());
        assert_eq!(
            store.current(&CounterKey::new("2.0.0-feature-x")).await.unwrap(),
            Some(total)
        );
    }

    #[tokio::test]
    async fn test_corrupted_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileCounterStore::new(&path);
        let err = store.next(&key("1.0.0")).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Storage(StorageError::Corrupted { .. })
        ));
        // The broken file is left for inspection
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_unknown_format_version_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        fs::write(&path, r#"{"format_version": 99, "counters": {}}"#).unwrap();

        let err = FileCounterStore::new(&path).current(&key("1.0.0")).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Storage(StorageError::Corrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::new(dir.path().join("nope").join("counters.json"))
            .with_lock_timeout(Duration::ZERO);
        let err = store.next(&key("1.0.0")).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Storage(StorageError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_held_lock_times_out_without_issuing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        let store = FileCounterStore::new(&path).with_lock_timeout(Duration::from_millis(150));

        let _held = CounterLock::acquire(store.lock_path(), Duration::ZERO)
            .await
            .unwrap();
        let err = store.next(&key("1.0.0")).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Storage(StorageError::LockTimeout { .. })
        ));
        assert_eq!(store.current(&key("1.0.0")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sidecars_never_collide_with_the_document() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["build.lock", "build.tmp", "counters.json"] {
            let store = FileCounterStore::new(dir.path().join(name));
            assert_ne!(store.lock_path(), store.path());
            assert_eq!(store.next(&key("1.0.0")).await.unwrap(), 1);
            assert_eq!(store.next(&key("1.0.0")).await.unwrap(), 2);
        }
        assert!(dir.path().join("counters.json.lock").exists());
    }
}
