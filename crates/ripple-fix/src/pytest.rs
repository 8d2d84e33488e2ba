//! Reader for pytest's terminal output under `-rA --tb=short`.
//!
//! The short summary gives one `STATUS id[ - message]` line per test; the
//! FAILURES and ERRORS sections give a traceback block per test, headed by
//! a `____ title ____` line.

use std::collections::BTreeMap;

use crate::runner::{TestFailure, TestRunOutcome};

pub fn parse_output(stdout: &str) -> TestRunOutcome {
    let tracebacks = traceback_sections(stdout);
    let mut outcome = TestRunOutcome::default();

    for line in stdout.lines() {
        let Some((status, rest)) = line.split_once(' ') else {
            continue;
        };
        let (id, message) = match rest.split_once(" - ") {
            Some((id, message)) => (id.trim(), message.trim()),
            None => (rest.trim(), ""),
        };
        if id.is_empty() {
            continue;
        }
        match status {
            "PASSED" | "XFAIL" | "XPASS" => outcome.passed.push(id.to_string()),
            "FAILED" | "ERROR" => {
                let traceback = tracebacks
                    .iter()
                    .find(|(title, _)| section_matches(id, title))
                    .map(|(_, block)| block.join("\n"))
                    .unwrap_or_default();
                let message = if message.is_empty() {
                    last_error_line(&traceback)
                } else {
                    message.to_string()
                };
                let failure = TestFailure {
                    id: id.to_string(),
                    message,
                    traceback,
                };
                if status == "FAILED" {
                    outcome.failed.push(failure);
                } else {
                    outcome.errored.push(failure);
                }
            }
            _ => {}
        }
    }
    outcome
}

/// Traceback blocks by section title, from the FAILURES and ERRORS parts.
fn traceback_sections(stdout: &str) -> BTreeMap<String, Vec<String>> {
    let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut in_report = false;
    let mut current: Option<String> = None;

    for line in stdout.lines() {
        if line.starts_with("===") {
            let title = line.trim_matches('=').trim();
            in_report = title == "FAILURES" || title == "ERRORS";
            current = None;
            continue;
        }
        if !in_report {
            continue;
        }
        if line.starts_with("___") && line.ends_with("___") {
            let title = line.trim_matches('_').trim();
            let title = title
                .strip_prefix("ERROR at setup of ")
                .or_else(|| title.strip_prefix("ERROR at teardown of "))
                .or_else(|| title.strip_prefix("ERROR collecting "))
                .unwrap_or(title);
            current = Some(title.to_string());
            sections.entry(title.to_string()).or_default();
            continue;
        }
        if let Some(title) = &current {
            if let Some(block) = sections.get_mut(title) {
                block.push(line.to_string());
            }
        }
    }
    sections
}

/// `Class.test_x` in a section title corresponds to `path::Class::test_x`.
fn section_matches(id: &str, title: &str) -> bool {
    let title = title.replace('.', "::");
    id == title || id.ends_with(&format!("::{title}"))
}

fn last_error_line(traceback: &str) -> String {
    traceback
        .lines()
        .rev()
        .find_map(|l| l.strip_prefix("E "))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}
