// Exit code conventions: 0 success, 1 unsuccessful outcome, 2 error.

use std::process::Command;

use super::common;

#[test]
fn test_missing_repo_is_two() {
    let out = Command::new(common::ripple_bin())
        .args(["build", "-C", "/no/such/ripple/repo"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid repository"));
}

#[test]
fn test_unsupported_completion_shell_is_two() {
    let out = Command::new(common::ripple_bin())
        .args(["completion", "tcsh"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_completion_bash() {
    let out = Command::new(common::ripple_bin())
        .args(["completion", "bash"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("ripple"));
}

#[test]
fn test_fix_without_agent_is_two() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .args(["fix", "--task", "make it pass"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("agent"));
}
