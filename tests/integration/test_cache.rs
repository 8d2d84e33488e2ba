// Snapshot caching: idempotent rebuilds and the on-disk store.

use ripple_core::cancel::CancellationToken;
use ripple_core::config::RIPPLE_DIR;
use ripple_core::sqlite::SNAPSHOT_DB;
use ripple_impact::engine::{BuildRequest, ImpactEngine};

use super::common;

#[test]
fn test_same_commit_twice_is_a_hit() {
    let dir = common::scenario_project();
    let engine = ImpactEngine::new(4);
    let request = BuildRequest::new(dir.path()).with_commit("c1");

    let first = engine.build_graph(&request, &CancellationToken::new()).unwrap();
    let second = engine.build_graph(&request, &CancellationToken::new()).unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.nodes_created, second.nodes_created);
    assert_eq!(first.edges_created, second.edges_created);
    assert_eq!(second.files_parsed, 0);
}

#[test]
fn test_force_rebuild_reparses() {
    let dir = common::scenario_project();
    let engine = ImpactEngine::new(4);
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    engine.build_graph(&request, &CancellationToken::new()).unwrap();

    let forced = engine
        .build_graph(&request.clone().forced(true), &CancellationToken::new())
        .unwrap();
    assert!(!forced.cache_hit);
    assert_eq!(forced.files_parsed, 2);
}

#[test]
fn test_snapshot_persisted_to_sqlite() {
    let dir = common::scenario_project();
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let built = ImpactEngine::new(4)
        .build_graph(&request, &CancellationToken::new())
        .unwrap();

    let db = dir.path().join(RIPPLE_DIR).join(SNAPSHOT_DB);
    let conn = rusqlite::Connection::open(&db).unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM snapshots WHERE commit_id = 'c1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);

    // a fresh engine (new process) loads it instead of rebuilding
    let loaded = ImpactEngine::new(4)
        .build_graph(&request, &CancellationToken::new())
        .unwrap();
    assert!(loaded.cache_hit);
    assert_eq!(loaded.nodes_created, built.nodes_created);
}
