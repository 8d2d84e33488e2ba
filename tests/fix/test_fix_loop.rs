// The orchestrator end to end: a scripted agent edits the working tree,
// the engine re-selects tests, a stand-in runner checks the edit.

use std::fs;
use std::process::Command;
use std::time::Duration;

use ripple_core::config::{FixConfig, RippleConfig, RIPPLE_DIR};
use ripple_fix::agent::CommandAgent;
use ripple_fix::orchestrator::{EngineImpact, FixOutcome, FixState, Orchestrator};
use ripple_fix::runner::SubprocessRunner;
use ripple_impact::engine::ImpactEngine;

use super::common;

/// Breaks `add` on the first attempt, repairs it once feedback arrives.
const LEARNING_AGENT: &str = r#"prompt=$(cat)
if printf '%s' "$prompt" | grep -q 'did not pass'; then
  printf 'def add(a, b):\n    return a + b\n' > mod.py
else
  printf 'def add(a, b):\n    return a - b\n' > mod.py
fi
echo mod.py
"#;

/// Never gets it right.
const STUBBORN_AGENT: &str = r#"cat > /dev/null
printf 'def add(a, b):\n    return a * b\n' > mod.py
echo mod.py
"#;

#[test]
fn test_feedback_drives_second_candidate_to_pass() {
    let dir = common::scenario_project();
    fs::write(dir.path().join("agent.sh"), LEARNING_AGENT).unwrap();

    let engine = ImpactEngine::new(8);
    let impact = EngineImpact::new(&engine, dir.path(), "base");
    let runner = SubprocessRunner::new(common::grep_runner("a + b", "mod.py"));
    let mut agent =
        CommandAgent::new(vec!["sh".to_string(), "agent.sh".to_string()], dir.path()).unwrap();

    let report = Orchestrator::new(
        &mut agent,
        &impact,
        &runner,
        dir.path(),
        FixConfig::default(),
        Duration::from_secs(30),
    )
    .run("Make test_add pass.");

    assert_eq!(report.outcome, FixOutcome::AllPassed, "{:?}", report.reason);
    assert_eq!(report.iterations.len(), 2);
    assert_eq!(report.test_runs(), 2);
    let first = report.iterations[0].run.as_ref().unwrap();
    assert_eq!(first.failed[0].id, "test_mod.py::test_add");
    assert_eq!(report.iterations[1].impacted[0].test_id, "test_mod.py::test_add");
    assert_eq!(report.transitions.last(), Some(&FixState::AllPassed));
}

#[test]
fn test_cli_fix_stops_unresolved_at_cap() {
    let dir = common::scenario_project();
    fs::write(dir.path().join("agent.sh"), STUBBORN_AGENT).unwrap();
    let mut config = RippleConfig::default();
    config.runner.command = common::grep_runner("a + b", "mod.py");
    config.save(&dir.path().join(RIPPLE_DIR)).unwrap();

    let out = Command::new(common::ripple_bin())
        .args(["fix", "--task", "Make test_add pass.", "--json", "--", "sh", "agent.sh"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["outcome"], "unresolved");
    assert_eq!(report["iterations"].as_array().unwrap().len(), 3);
    let runs = report["transitions"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| *s == "running_tests")
        .count();
    assert_eq!(runs, 3);
}
