use super::*;
use std::fs;

use crate::types::{ImpactStrategy, QueryError};

const MOD: &str = "def add(a, b):\n    return a + b\n";
const TEST_MOD: &str = "from mod import add\n\n\ndef test_add():\n    assert add(1, 2) == 3\n";

fn repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mod.py"), MOD).unwrap();
    fs::write(dir.path().join("test_mod.py"), TEST_MOD).unwrap();
    dir
}

fn impact_request(root: &Path, commit: &str, changed: &[&str]) -> ImpactRequest {
    ImpactRequest {
        repo_path: root.to_path_buf(),
        commit_id: Some(commit.to_string()),
        changed_files: changed.iter().map(|s| s.to_string()).collect(),
        threshold: Some(0.5),
        max_results: None,
    }
}

#[test]
fn test_second_build_is_cache_hit() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let cancel = CancellationToken::new();

    let first = engine.build_graph(&request, &cancel).unwrap();
    assert!(!first.cache_hit);
    assert_eq!(first.files_parsed, 2);
    assert_eq!(first.tests, 1);

    let second = engine.build_graph(&request, &cancel).unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.nodes_created, first.nodes_created);
    assert_eq!(second.edges_created, first.edges_created);
}

#[test]
fn test_force_rebuild_skips_cache() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let cancel = CancellationToken::new();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    engine.build_graph(&request, &cancel).unwrap();

    let forced = engine
        .build_graph(&request.clone().forced(true), &cancel)
        .unwrap();
    assert!(!forced.cache_hit);
    assert_eq!(forced.generation, 1);
}

#[test]
fn test_persisted_snapshot_survives_engine() {
    let dir = repo();
    let cancel = CancellationToken::new();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let first = ImpactEngine::default().build_graph(&request, &cancel).unwrap();
    assert!(dir.path().join(".ripple").join("snapshots.db").exists());

    let second = ImpactEngine::default().build_graph(&request, &cancel).unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.nodes_created, first.nodes_created);
    assert_eq!(second.edges_created, first.edges_created);
}

#[test]
fn test_persist_disabled_by_config() {
    let dir = repo();
    let mut config = RippleConfig::default();
    config.cache.persist = false;
    config.save(&dir.path().join(".ripple")).unwrap();

    let request = BuildRequest::new(dir.path()).with_commit("c1");
    ImpactEngine::default()
        .build_graph(&request, &CancellationToken::new())
        .unwrap();
    assert!(!dir.path().join(".ripple").join("snapshots.db").exists());
}

#[test]
fn test_impacted_tests_builds_on_miss() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let results = engine
        .get_impacted_tests(
            &impact_request(dir.path(), "c1", &["mod.py"]),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].test_id, "test_mod.py::test_add");
    assert_eq!(results[0].score, 1.0);
    assert_eq!(results[0].strategy, ImpactStrategy::Naming);
}

#[test]
fn test_malformed_query_rejected_before_build() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let err = engine
        .get_impacted_tests(
            &impact_request(dir.path(), "c1", &[]),
            &CancellationToken::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Query(QueryError::EmptyChangedFiles)
    ));
    assert!(!dir.path().join(".ripple").exists());
}

#[test]
fn test_cancelled_build_not_cached() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        engine.build_graph(&request, &cancel),
        Err(BuildError::Cancelled)
    ));

    let report = engine
        .build_graph(&request, &CancellationToken::new())
        .unwrap();
    assert!(!report.cache_hit);
}

#[test]
fn test_new_commit_builds_incrementally() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let cancel = CancellationToken::new();
    engine
        .build_graph(&BuildRequest::new(dir.path()).with_commit("c1"), &cancel)
        .unwrap();

    fs::write(dir.path().join("mod.py"), "def add(a, b):\n    return b + a\n").unwrap();
    let report = engine
        .build_graph(&BuildRequest::new(dir.path()).with_commit("c2"), &cancel)
        .unwrap();
    assert!(!report.cache_hit);
    assert_eq!(report.generation, 2);
    assert_eq!(report.files_parsed, 1);
    assert_eq!(report.files_reused, 1);
}

#[test]
fn test_explicit_coverage_file_must_load() {
    let dir = repo();
    let mut request = BuildRequest::new(dir.path()).with_commit("c1");
    request.coverage_file = Some(PathBuf::from("missing.json"));
    let result = ImpactEngine::default().build_graph(&request, &CancellationToken::new());
    assert!(matches!(result, Err(BuildError::Coverage(_))));
}

#[test]
fn test_coverage_file_adds_links() {
    let dir = repo();
    fs::write(
        dir.path().join("cov.json"),
        r#"{"test_mod.py::test_add": {"mod.py": {"2": 1}}}"#,
    )
    .unwrap();
    let mut request = BuildRequest::new(dir.path()).with_commit("c1");
    request.coverage_file = Some(PathBuf::from("cov.json"));
    let engine = ImpactEngine::default();
    let snapshot = engine.snapshot(&request, &CancellationToken::new()).unwrap();
    let depends = snapshot
        .graph
        .edges_of_kind(ripple_core::types::EdgeKind::DependsOn)
        .count();
    assert_eq!(depends, 1);
}

#[test]
fn test_invalid_repo_path() {
    let dir = tempfile::tempdir().unwrap();
    let request = BuildRequest::new(dir.path().join("missing"));
    let result = ImpactEngine::default().build_graph(&request, &CancellationToken::new());
    assert!(matches!(result, Err(BuildError::InvalidRepo { .. })));
}

#[test]
fn test_invalidate_forces_rebuild() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let cancel = CancellationToken::new();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    engine.build_graph(&request, &cancel).unwrap();
    assert_eq!(engine.invalidate(dir.path(), Some("c1")).unwrap(), 1);
    assert!(!engine.build_graph(&request, &cancel).unwrap().cache_hit);
}

#[test]
fn test_concurrent_queries_agree() {
    let dir = repo();
    let engine = ImpactEngine::default();
    let cancel = CancellationToken::new();
    engine
        .build_graph(&BuildRequest::new(dir.path()).with_commit("c1"), &cancel)
        .unwrap();
    let request = impact_request(dir.path(), "c1", &["mod.py"]);
    let results: Vec<Vec<ImpactedTest>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.get_impacted_tests(&request, &cancel).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0].len(), 1);
}

#[test]
fn test_worktree_query_ignores_reused_label() {
    let dir = repo();
    let cancel = CancellationToken::new();
    let request = impact_request(dir.path(), "base+candidate1", &["mod.py"]);
    let ids = |tests: Vec<ImpactedTest>| -> Vec<String> {
        tests.into_iter().map(|t| t.test_id).collect()
    };

    let first = ImpactEngine::default()
        .get_worktree_impacted_tests(&request, &cancel)
        .unwrap();
    assert_eq!(ids(first), vec!["test_mod.py::test_add"]);
    let db = SnapshotDb::open(&dir.path().join(RIPPLE_DIR).join(SNAPSHOT_DB)).unwrap();
    let repo_id = Repo::open(dir.path()).unwrap().repo_id;
    assert!(db.load(&repo_id, "base+candidate1").unwrap().is_none());

    fs::write(
        dir.path().join("test_extra.py"),
        "from mod import add\n\n\ndef test_add_twice():\n    assert add(add(1, 1), 1) == 3\n",
    )
    .unwrap();
    let engine = ImpactEngine::default();
    let second = engine.get_worktree_impacted_tests(&request, &cancel).unwrap();
    assert_eq!(
        ids(second),
        vec!["test_mod.py::test_add", "test_extra.py::test_add_twice"]
    );

    // a later query in the same engine still reads the tree
    fs::remove_file(dir.path().join("test_extra.py")).unwrap();
    let third = engine.get_worktree_impacted_tests(&request, &cancel).unwrap();
    assert_eq!(ids(third), vec!["test_mod.py::test_add"]);
}
