//! Build counter storage.
//!
//! A build counter is a monotonic integer per [`CounterKey`], shared by every build of
//! the same version and branch. Implementations must make `next` linearizable per key:
//! concurrent callers always receive distinct, increasing values.

mod file_store;
mod lock;

pub use file_store::{COUNTER_FORMAT_VERSION, CounterDocument, CounterRecord, FileCounterStore};

use crate::error::{Result, StorageError};
use crate::version::CounterKey;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// Persistent per-key build counter
pub trait BuildCounterStore {
    /// Increment the counter for `key` and return the new value (first value is 1)
    fn next(&self, key: &CounterKey) -> impl Future<Output = Result<u64>> + Send;

    /// Last issued value for `key`, without modifying anything
    fn current(&self, key: &CounterKey) -> impl Future<Output = Result<Option<u64>>> + Send;
}

/// In-process [`BuildCounterStore`] for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<BTreeMap<CounterKey, u64>>,
}

impl MemoryCounterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with last-issued values
    pub fn with_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let counters = values
            .into_iter()
            .map(|(key, value)| (CounterKey::new(key), value))
            .collect();
        Self {
            counters: Mutex::new(counters),
        }
    }

    /// Copy of every key and its last issued value
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), *v))
            .collect()
    }
}

impl BuildCounterStore for MemoryCounterStore {
    async fn next(&self, key: &CounterKey) -> Result<u64> {
        let mut counters = self.counters.lock().map_err(|_| StorageError::Corrupted {
            reason: "in-memory counter lock poisoned".to_string(),
        })?;
        let value = counters.entry(key.clone()).or_insert(0);
        *value = value.checked_add(1).ok_or_else(|| StorageError::Corrupted {
            reason: format!("counter for {} overflowed", key),
        })?;
        Ok(*value)
    }

    async fn current(&self, key: &CounterKey) -> Result<Option<u64>> {
        let counters = self.counters.lock().map_err(|_| StorageError::Corrupted {
            reason: "in-memory counter lock poisoned".to_string(),
        })?;
        Ok(counters.get(key).copied())
    }
}
