// Tests for `ripple build`.

use std::process::Command;

use super::common;

fn build(dir: &std::path::Path, extra: &[&str]) -> serde_json::Value {
    let out = Command::new(common::ripple_bin())
        .args(["build", "--json", "--commit", "c1"])
        .args(extra)
        .arg("-C")
        .arg(dir)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn test_build_reports_counts() {
    let dir = common::scenario_project();
    let report = build(dir.path(), &[]);
    assert_eq!(report["cache_hit"], false);
    assert_eq!(report["tests"], 1);
    assert_eq!(report["files_parsed"], 2);
    assert_eq!(report["generation"], 1);
}

#[test]
fn test_second_build_loads_persisted_snapshot() {
    let dir = common::scenario_project();
    let first = build(dir.path(), &[]);
    let second = build(dir.path(), &[]);
    assert_eq!(second["cache_hit"], true);
    assert_eq!(first["nodes_created"], second["nodes_created"]);
    assert_eq!(first["edges_created"], second["edges_created"]);

    let forced = build(dir.path(), &["--force"]);
    assert_eq!(forced["cache_hit"], false);
}

#[test]
fn test_build_human_output() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .args(["build", "--commit", "c1"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("@ c1 (generation 1)"), "{stdout}");
    assert!(stdout.contains("1 tests"), "{stdout}");
}
