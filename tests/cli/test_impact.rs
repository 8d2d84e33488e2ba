// Tests for `ripple impact`.

use std::process::Command;

use super::common;

#[test]
fn test_impact_json() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .args(["impact", "mod.py", "--json", "--commit", "c1", "--threshold", "0.5"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let tests: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let tests = tests.as_array().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0]["test_id"], "test_mod.py::test_add");
    assert_eq!(tests[0]["score"], 1.0);
    assert_eq!(tests[0]["strategy"], "naming");
}

#[test]
fn test_impact_human() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .args(["impact", "mod.py", "--commit", "c1"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("1.00  test_mod.py::test_add  naming"), "{stdout}");
}

#[test]
fn test_impact_rejects_bad_threshold() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .args(["impact", "mod.py", "--threshold", "1.5", "--commit", "c1"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("threshold"));
    // rejected before any build
    assert!(!dir.path().join(".ripple").exists());
}
