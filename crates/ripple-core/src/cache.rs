//! In-memory LRU of immutable snapshots keyed by `(repo identity, commit)`.
//!
//! Values are handed out as `Arc<T>` so a reader keeps its snapshot alive
//! even if the entry is evicted or replaced while it is being queried.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Cache key: repository identity plus commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub repo_id: String,
    pub commit_id: String,
}

impl SnapshotKey {
    pub fn new(repo_id: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            commit_id: commit_id.into(),
        }
    }
}

/// Thread-safe LRU cache. Most recently used entries sit at the back.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    capacity: usize,
    entries: RwLock<VecDeque<(SnapshotKey, Arc<T>)>>,
}

impl<T> SnapshotCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up an entry and mark it most recently used.
    pub fn get(&self, key: &SnapshotKey) -> Option<Arc<T>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let pos = entries.iter().position(|(k, _)| k == key)?;
        let entry = entries.remove(pos)?;
        let value = Arc::clone(&entry.1);
        entries.push_back(entry);
        Some(value)
    }

    /// The most recently used entry for a repository, any commit.
    pub fn latest_for_repo(&self, repo_id: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .rev()
            .find(|(k, _)| k.repo_id == repo_id)
            .map(|(_, v)| Arc::clone(v))
    }

    /// Insert or replace an entry, evicting the least recently used one when full.
    pub fn insert(&self, key: SnapshotKey, value: Arc<T>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(k, _)| *k != key);
        while entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.pop_front() {
                tracing::debug!(repo = %evicted.repo_id, commit = %evicted.commit_id, "evicted snapshot");
            }
        }
        entries.push_back((key, value));
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &SnapshotKey) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        entries.len() != before
    }

    /// Drop every entry for a repository.
    pub fn invalidate_repo(&self, repo_id: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(k, _)| k.repo_id != repo_id);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
