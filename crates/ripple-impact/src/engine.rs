//! `build_graph` / `get_impacted_tests` with snapshot caching.
//!
//! Snapshots live in an in-memory LRU keyed by `(repo identity, commit)`
//! and, when `cache.persist` is set, in `.ripple/snapshots.db`. A miss
//! builds incrementally from the most recent snapshot of the same
//! repository. Cancelled builds are never cached. Working-tree queries
//! always rebuild and stay out of the persistent cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use ripple_core::cache::{SnapshotCache, SnapshotKey};
use ripple_core::cancel::CancellationToken;
use ripple_core::config::{CacheConfig, RippleConfig, RIPPLE_DIR};
use ripple_core::coverage::CoverageData;
use ripple_core::hash;
use ripple_core::sqlite::{SnapshotDb, StoredSnapshot, SNAPSHOT_DB};
use ripple_core::vcs;

use crate::analyzer;
use crate::builder::{build_snapshot, BuildInput};
use crate::snapshot::Snapshot;
use crate::types::{BuildError, BuildReport, EngineError, ImpactQuery, ImpactedTest};

/// Arguments of `build_graph`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub repo_path: PathBuf,
    /// Defaults to `git rev-parse HEAD`, or `"worktree"` outside git.
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub force_rebuild: bool,
    /// Coverage JSON; overrides `linker.coverage_file`.
    #[serde(default)]
    pub coverage_file: Option<PathBuf>,
}

impl BuildRequest {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            ..Self::default()
        }
    }

    pub fn with_commit(mut self, commit_id: impl Into<String>) -> Self {
        self.commit_id = Some(commit_id.into());
        self
    }

    pub fn forced(mut self, force_rebuild: bool) -> Self {
        self.force_rebuild = force_rebuild;
        self
    }
}

/// Arguments of `get_impacted_tests`. Unset limits come from the repo config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactRequest {
    pub repo_path: PathBuf,
    #[serde(default)]
    pub commit_id: Option<String>,
    pub changed_files: Vec<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// A resolved repository: canonical root, identity and config.
#[derive(Debug, Clone)]
pub struct Repo {
    pub root: PathBuf,
    pub repo_id: String,
    pub config: RippleConfig,
}

impl Repo {
    pub fn open(path: &Path) -> Result<Self, BuildError> {
        let invalid = |reason: String| BuildError::InvalidRepo {
            path: path.display().to_string(),
            reason,
        };
        let root = path.canonicalize().map_err(|e| invalid(e.to_string()))?;
        if !root.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }
        let repo_id = hash::repo_id(&root.to_string_lossy());
        let config = RippleConfig::for_repo(&root);
        Ok(Self {
            root,
            repo_id,
            config,
        })
    }

    fn db(&self) -> Option<SnapshotDb> {
        if !self.config.cache.persist {
            return None;
        }
        let path = self.root.join(RIPPLE_DIR).join(SNAPSHOT_DB);
        match SnapshotDb::open(&path) {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "snapshot db unavailable, caching in memory only");
                None
            }
        }
    }

    fn coverage(&self, explicit: Option<&Path>) -> Result<Option<CoverageData>, BuildError> {
        if let Some(path) = explicit {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.root.join(path)
            };
            return Ok(Some(CoverageData::load(&path)?));
        }
        let Some(rel) = &self.config.linker.coverage_file else {
            return Ok(None);
        };
        match CoverageData::load(&self.root.join(rel)) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(error = %e, "configured coverage unusable, linking without it");
                Ok(None)
            }
        }
    }
}

/// How `load_or_build` treats cached snapshots.
#[derive(Debug, Clone, Copy)]
struct BuildPolicy {
    reuse_cached: bool,
    incremental: bool,
    persist: bool,
}

impl BuildPolicy {
    const CACHED: Self = Self {
        reuse_cached: true,
        incremental: true,
        persist: true,
    };
    const FORCED: Self = Self {
        reuse_cached: false,
        incremental: false,
        persist: true,
    };
    /// Always read the working tree; the commit label is not trusted to
    /// identify content, so the result is kept in memory only.
    const WORKTREE: Self = Self {
        reuse_cached: false,
        incremental: true,
        persist: false,
    };

    fn forced(force_rebuild: bool) -> Self {
        if force_rebuild {
            Self::FORCED
        } else {
            Self::CACHED
        }
    }
}

/// Shared, thread-safe entry point for builds and impact queries.
pub struct ImpactEngine {
    cache: SnapshotCache<Snapshot>,
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::new(CacheConfig::default().memory_capacity)
    }
}

impl ImpactEngine {
    pub fn new(memory_capacity: usize) -> Self {
        Self {
            cache: SnapshotCache::new(memory_capacity),
        }
    }

    /// Build (or fetch from cache) the snapshot for a repository commit.
    pub fn build_graph(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let repo = Repo::open(&request.repo_path)?;
        let (snapshot, cache_hit) = self.load_or_build(
            &repo,
            request.commit_id.as_deref(),
            BuildPolicy::forced(request.force_rebuild),
            request.coverage_file.as_deref(),
            cancel,
        )?;
        Ok(report(
            &snapshot,
            cache_hit,
            started.elapsed().as_millis() as u64,
        ))
    }

    /// The snapshot for a repository commit, building it on a miss.
    pub fn snapshot(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot>, BuildError> {
        let repo = Repo::open(&request.repo_path)?;
        self.load_or_build(
            &repo,
            request.commit_id.as_deref(),
            BuildPolicy::forced(request.force_rebuild),
            request.coverage_file.as_deref(),
            cancel,
        )
        .map(|(snapshot, _)| snapshot)
    }

    /// Ranked impacted tests. Malformed queries are rejected before any build.
    pub fn get_impacted_tests(
        &self,
        request: &ImpactRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImpactedTest>, EngineError> {
        self.impacted(request, BuildPolicy::CACHED, cancel)
    }

    /// Ranked impacted tests against the working tree as it is now. The
    /// snapshot is rebuilt (incrementally from the latest one in memory)
    /// even when `commit_id` was seen before, and is never persisted.
    pub fn get_worktree_impacted_tests(
        &self,
        request: &ImpactRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImpactedTest>, EngineError> {
        self.impacted(request, BuildPolicy::WORKTREE, cancel)
    }

    fn impacted(
        &self,
        request: &ImpactRequest,
        policy: BuildPolicy,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImpactedTest>, EngineError> {
        let repo = Repo::open(&request.repo_path)?;
        let mut query = ImpactQuery::from_config(&repo.config.impact);
        if let Some(threshold) = request.threshold {
            query.threshold = threshold;
        }
        if let Some(max_results) = request.max_results {
            query.max_results = max_results;
        }
        analyzer::validate(&request.changed_files, &query)?;

        let (snapshot, _) =
            self.load_or_build(&repo, request.commit_id.as_deref(), policy, None, cancel)?;
        Ok(analyzer::impacted_tests(
            &snapshot,
            &request.changed_files,
            &query,
            cancel,
        )?)
    }

    /// Drop cached snapshots of a repository: one commit, or all of them.
    pub fn invalidate(&self, repo_path: &Path, commit_id: Option<&str>) -> Result<usize, BuildError> {
        let repo = Repo::open(repo_path)?;
        let db = repo.db();
        let removed = match commit_id {
            Some(commit) => {
                let in_memory = self.cache.invalidate(&SnapshotKey::new(&repo.repo_id, commit));
                let on_disk = db
                    .as_ref()
                    .and_then(|db| db.delete(&repo.repo_id, commit).ok())
                    .unwrap_or(false);
                usize::from(in_memory || on_disk)
            }
            None => {
                let in_memory = self.cache.invalidate_repo(&repo.repo_id);
                let on_disk = db
                    .as_ref()
                    .and_then(|db| db.prune(&repo.repo_id, 0).ok())
                    .unwrap_or(0);
                in_memory.max(on_disk)
            }
        };
        tracing::info!(repo = %repo.root.display(), removed, "snapshot cache invalidated");
        Ok(removed)
    }

    fn load_or_build(
        &self,
        repo: &Repo,
        commit_id: Option<&str>,
        policy: BuildPolicy,
        coverage_file: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<(Arc<Snapshot>, bool), BuildError> {
        let commit_id = vcs::resolve_commit(&repo.root, commit_id);
        let key = SnapshotKey::new(&repo.repo_id, &commit_id);
        if policy.reuse_cached {
            if let Some(snapshot) = self.cache.get(&key) {
                tracing::debug!(commit = %commit_id, "snapshot cache hit");
                return Ok((snapshot, true));
            }
        }

        let db = if policy.persist { repo.db() } else { None };
        if policy.reuse_cached {
            if let Some(snapshot) = db.as_ref().and_then(|db| load_persisted(db, &key)) {
                tracing::debug!(commit = %commit_id, "snapshot loaded from disk");
                let snapshot = Arc::new(snapshot);
                self.cache.insert(key, Arc::clone(&snapshot));
                return Ok((snapshot, true));
            }
        }

        let coverage = repo.coverage(coverage_file)?;
        let previous = if policy.incremental {
            self.cache.latest_for_repo(&repo.repo_id)
        } else {
            None
        };
        let snapshot = build_snapshot(
            &BuildInput {
                root: &repo.root,
                repo_id: &repo.repo_id,
                commit_id: &commit_id,
                config: &repo.config,
                previous: previous.as_deref(),
                coverage: coverage.as_ref(),
            },
            cancel,
        )?;
        let snapshot = Arc::new(snapshot);

        if let Some(db) = &db {
            persist(db, &snapshot, self.cache.capacity());
        }
        self.cache.insert(key, Arc::clone(&snapshot));
        Ok((snapshot, false))
    }
}

fn load_persisted(db: &SnapshotDb, key: &SnapshotKey) -> Option<Snapshot> {
    let stored = match db.load(&key.repo_id, &key.commit_id) {
        Ok(stored) => stored?,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read snapshot db");
            return None;
        }
    };
    match serde_json::from_str(&stored.payload) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable persisted snapshot");
            None
        }
    }
}

fn persist(db: &SnapshotDb, snapshot: &Snapshot, keep: usize) {
    let payload = match serde_json::to_string(snapshot) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize snapshot");
            return;
        }
    };
    let record = StoredSnapshot {
        repo_id: snapshot.repo_id.clone(),
        commit_id: snapshot.commit_id.clone(),
        generation: snapshot.generation,
        payload,
    };
    if let Err(e) = db
        .save(&record)
        .and_then(|_| db.prune(&snapshot.repo_id, keep))
    {
        tracing::warn!(error = %e, "failed to persist snapshot");
    }
}

fn report(snapshot: &Snapshot, cache_hit: bool, elapsed_ms: u64) -> BuildReport {
    let (files_parsed, files_reused) = if cache_hit {
        (0, snapshot.files.len())
    } else {
        (snapshot.stats.files_parsed, snapshot.stats.files_reused)
    };
    BuildReport {
        repo_id: snapshot.repo_id.clone(),
        commit_id: snapshot.commit_id.clone(),
        generation: snapshot.generation,
        nodes_created: snapshot.node_count(),
        edges_created: snapshot.edge_count(),
        build_time_ms: elapsed_ms,
        cache_hit,
        files_parsed,
        files_reused,
        partial_files: snapshot.partial_files().into_iter().cloned().collect(),
        unresolved_references: snapshot.unresolved.len(),
        tests: snapshot.test_count(),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
