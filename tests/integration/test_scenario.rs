// The two-file add scenario through the public engine API.

use ripple_core::cancel::CancellationToken;
use ripple_core::hash::node_id;
use ripple_core::types::{EdgeKind, LinkStrategy, NodeKind};
use ripple_impact::engine::{BuildRequest, ImpactEngine, ImpactRequest};
use ripple_impact::types::ImpactStrategy;

use super::common;

#[test]
fn test_naming_link_and_impact() {
    let dir = common::scenario_project();
    let engine = ImpactEngine::new(4);
    let cancel = CancellationToken::new();

    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let report = engine.build_graph(&request, &cancel).unwrap();
    assert!(!report.cache_hit);
    assert_eq!(report.tests, 1);
    assert!(report.partial_files.is_empty());

    let snapshot = engine.snapshot(&request, &cancel).unwrap();
    let test_add = node_id(NodeKind::Test, "test_mod.py", "test_add");
    let add = node_id(NodeKind::Function, "mod.py", "add");
    let link = snapshot.graph.edge(test_add, add, EdgeKind::Tests).unwrap();
    assert_eq!(link.confidence, 1.0);
    assert_eq!(link.strategy, Some(LinkStrategy::Naming));
    common::assert_no_dangling_edges(&snapshot);

    let impacted = engine
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: vec!["mod.py".to_string()],
                threshold: Some(0.5),
                max_results: None,
            },
            &cancel,
        )
        .unwrap();
    assert_eq!(impacted.len(), 1);
    assert_eq!(impacted[0].test_id, "test_mod.py::test_add");
    assert_eq!(impacted[0].score, 1.0);
    assert_eq!(impacted[0].strategy, ImpactStrategy::Naming);
}

#[test]
fn test_naming_link_without_import() {
    let dir = common::create_project(&[
        ("mod.py", common::MOD_PY),
        ("test_mod.py", "def test_add():\n    assert add(1, 2) == 3\n"),
    ]);
    let engine = ImpactEngine::new(4);
    let cancel = CancellationToken::new();

    let snapshot = engine
        .snapshot(&BuildRequest::new(dir.path()).with_commit("c1"), &cancel)
        .unwrap();
    let link = snapshot
        .graph
        .edge(
            node_id(NodeKind::Test, "test_mod.py", "test_add"),
            node_id(NodeKind::Function, "mod.py", "add"),
            EdgeKind::Tests,
        )
        .unwrap();
    assert_eq!(link.confidence, 1.0);
    assert_eq!(link.strategy, Some(LinkStrategy::Naming));

    let impacted = engine
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: vec!["mod.py".to_string()],
                threshold: Some(0.5),
                max_results: None,
            },
            &cancel,
        )
        .unwrap();
    assert_eq!(impacted.len(), 1);
    assert_eq!(impacted[0].test_id, "test_mod.py::test_add");
    assert_eq!(impacted[0].score, 1.0);
    assert_eq!(impacted[0].strategy, ImpactStrategy::Naming);
}

#[test]
fn test_direct_test_edit_selects_its_tests() {
    let dir = common::create_project(&[
        ("mod.py", common::MOD_PY),
        (
            "test_mod.py",
            "from mod import add\n\ndef test_add():\n    assert add(1, 2) == 3\n\n\
             def test_unrelated():\n    assert True\n",
        ),
    ]);
    let engine = ImpactEngine::new(4);
    let impacted = engine
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: vec!["./test_mod.py".to_string()],
                ..ImpactRequest::default()
            },
            &CancellationToken::new(),
        )
        .unwrap();
    let ids: Vec<&str> = impacted.iter().map(|t| t.test_id.as_str()).collect();
    assert_eq!(ids, vec!["test_mod.py::test_add", "test_mod.py::test_unrelated"]);
    assert!(impacted.iter().all(|t| t.score == 1.0));
    assert!(impacted
        .iter()
        .all(|t| t.strategy == ImpactStrategy::ChangedTestFile));
}

#[test]
fn test_unknown_file_impacts_nothing() {
    let dir = common::scenario_project();
    let impacted = ImpactEngine::new(4)
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: vec!["README.md".to_string()],
                ..ImpactRequest::default()
            },
            &CancellationToken::new(),
        )
        .unwrap();
    assert!(impacted.is_empty());
}
