// Tests for `ripple init`.

use std::process::Command;

use super::common;

#[test]
fn test_init_creates_config() {
    let dir = common::scenario_project();
    let out = Command::new(common::ripple_bin())
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let config = std::fs::read_to_string(dir.path().join(".ripple/ripple.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&config).unwrap();
    assert_eq!(value["fix"]["max_iterations"], 3);
    assert_eq!(value["impact"]["threshold"], 0.5);
}

#[test]
fn test_init_twice_fails() {
    let dir = common::scenario_project();
    let bin = common::ripple_bin();
    let first = Command::new(&bin).arg("init").current_dir(dir.path()).output().unwrap();
    assert!(first.status.success());
    let second = Command::new(&bin).arg("init").current_dir(dir.path()).output().unwrap();
    assert_eq!(second.status.code(), Some(2));
}
