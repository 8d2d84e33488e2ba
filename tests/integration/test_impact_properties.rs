// Properties of impact queries over a generated layered project.

use std::collections::HashSet;

use ripple_core::cancel::CancellationToken;
use ripple_impact::engine::{ImpactEngine, ImpactRequest};
use ripple_impact::types::ImpactStrategy;

use super::common;
use super::common::generators::layered_project;

fn project() -> tempfile::TempDir {
    let files = layered_project(5, 3);
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    common::create_project(&refs)
}

fn query(
    engine: &ImpactEngine,
    dir: &tempfile::TempDir,
    changed: &[&str],
    threshold: f64,
) -> Vec<ripple_impact::types::ImpactedTest> {
    engine
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: changed.iter().map(|s| s.to_string()).collect(),
                threshold: Some(threshold),
                max_results: Some(usize::MAX),
            },
            &CancellationToken::new(),
        )
        .unwrap()
}

#[test]
fn test_impact_is_monotone_in_changed_files() {
    let dir = project();
    let engine = ImpactEngine::new(4);
    let all = [
        "pkg/mod_0.py",
        "pkg/mod_1.py",
        "pkg/mod_2.py",
        "pkg/mod_3.py",
        "tests/test_mod_4.py",
    ];
    for threshold in [0.0, 0.3, 0.5] {
        for split in 1..all.len() {
            let small: HashSet<String> = query(&engine, &dir, &all[..split], threshold)
                .into_iter()
                .map(|t| t.test_id)
                .collect();
            let large: HashSet<String> = query(&engine, &dir, &all, threshold)
                .into_iter()
                .map(|t| t.test_id)
                .collect();
            assert!(
                small.is_subset(&large),
                "threshold {threshold}: {:?} not within {:?}",
                small.difference(&large).collect::<Vec<_>>(),
                large
            );
        }
    }
}

#[test]
fn test_results_sorted_and_bounded() {
    let dir = project();
    let engine = ImpactEngine::new(4);
    let results = query(&engine, &dir, &["pkg/mod_0.py"], 0.0);
    assert!(!results.is_empty());
    for pair in results.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].test_id < pair[1].test_id)
        );
    }
    assert!(results.iter().all(|t| (0.0..=1.0).contains(&t.score)));

    // direct naming links of the changed module rank first at 1.0
    for j in 0..3 {
        let id = format!("tests/test_mod_0.py::test_func_0_{j}");
        let hit = results.iter().find(|t| t.test_id == id).unwrap();
        assert_eq!(hit.score, 1.0);
        assert_eq!(hit.strategy, ImpactStrategy::Naming);
    }
}

#[test]
fn test_changed_test_file_scores_one() {
    let dir = project();
    let engine = ImpactEngine::new(4);
    let results = query(&engine, &dir, &["tests/test_mod_2.py"], 0.9);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|t| t.score == 1.0));
    assert!(results
        .iter()
        .all(|t| t.test_id.starts_with("tests/test_mod_2.py::")));
}
