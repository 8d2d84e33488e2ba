// Tests for `ripple run` with a stand-in test runner.

use std::process::Command;

use ripple_core::config::{RippleConfig, RIPPLE_DIR};

use super::common;

fn configure_runner(dir: &std::path::Path, command: Vec<String>) {
    let mut config = RippleConfig::default();
    config.runner.command = command;
    config.save(&dir.join(RIPPLE_DIR)).unwrap();
}

#[test]
fn test_run_changed_files_selects_and_passes() {
    let dir = common::scenario_project();
    configure_runner(dir.path(), common::grep_runner("a + b", "mod.py"));

    let out = Command::new(common::ripple_bin())
        .args(["run", "--changed", "mod.py", "--json"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    let outcome: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(outcome["passed"][0], "test_mod.py::test_add");
}

#[test]
fn test_run_failing_ids_exit_one() {
    let dir = common::scenario_project();
    configure_runner(dir.path(), common::grep_runner("a - b", "mod.py"));

    let out = Command::new(common::ripple_bin())
        .args(["run", "test_mod.py::test_add"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("FAILED test_mod.py::test_add"), "{stdout}");
    assert!(stdout.contains("0 passed, 1 failed, 0 errored"), "{stdout}");
}

#[test]
fn test_run_crashing_runner_exit_two() {
    let dir = common::scenario_project();
    configure_runner(
        dir.path(),
        vec!["sh".to_string(), "-c".to_string(), "exit 4".to_string()],
    );
    let out = Command::new(common::ripple_bin())
        .args(["run", "test_mod.py::test_add"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("crashed"));
}
