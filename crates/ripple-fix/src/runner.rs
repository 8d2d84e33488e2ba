//! RunImpactedTests: pytest over an explicit id list, as a subprocess.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use ripple_core::config::RunnerConfig;
use ripple_impact::engine::Repo;
use ripple_impact::types::BuildError;

use crate::pytest;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_TAIL_LINES: usize = 20;

/// A failed or errored test with the detail the agent needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub traceback: String,
}

/// Per-test results of one runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunOutcome {
    pub passed: Vec<String>,
    pub failed: Vec<TestFailure>,
    pub errored: Vec<TestFailure>,
}

impl TestRunOutcome {
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && self.errored.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.passed.is_empty() && self.all_passed()
    }

    /// Failed then errored tests.
    pub fn problems(&self) -> impl Iterator<Item = &TestFailure> {
        self.failed.iter().chain(&self.errored)
    }
}

/// The runner itself misbehaved; distinct from tests failing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunnerError {
    #[error("failed to start test runner: {message}")]
    Spawn { message: String },
    #[error("test runner timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("test runner crashed (exit code {code:?}): {stderr}")]
    Crashed { code: Option<i32>, stderr: String },
    #[error("test runner output could not be parsed")]
    Unparseable,
}

pub trait TestRunner: Send + Sync {
    fn run(
        &self,
        repo: &Path,
        test_ids: &[String],
        timeout: Duration,
    ) -> Result<TestRunOutcome, RunnerError>;
}

/// Runs the configured command with the test ids appended.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    command: Vec<String>,
}

impl SubprocessRunner {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.command.clone())
    }
}

impl TestRunner for SubprocessRunner {
    fn run(
        &self,
        repo: &Path,
        test_ids: &[String],
        timeout: Duration,
    ) -> Result<TestRunOutcome, RunnerError> {
        if test_ids.is_empty() {
            return Ok(TestRunOutcome::default());
        }
        let Some((program, args)) = self.command.split_first() else {
            return Err(RunnerError::Spawn {
                message: "runner command is empty".to_string(),
            });
        };

        let mut command = Command::new(program);
        command.args(args).args(test_ids).current_dir(repo);
        tracing::info!(tests = test_ids.len(), program = %program, "running impacted tests");

        let output = run_process(command, None, Some(timeout)).map_err(|e| match e {
            ProcessError::Spawn(e) => RunnerError::Spawn {
                message: e.to_string(),
            },
            ProcessError::Timeout => RunnerError::Timeout {
                seconds: timeout.as_secs(),
            },
        })?;

        let code = output.status.code();
        match code {
            // 0 all passed, 1 some failed, 5 nothing collected
            Some(0) | Some(1) | Some(5) => {}
            _ => {
                return Err(RunnerError::Crashed {
                    code,
                    stderr: tail(&output.stderr, STDERR_TAIL_LINES),
                })
            }
        }

        let mut outcome = pytest::parse_output(&output.stdout);
        if code == Some(5) {
            for id in test_ids {
                outcome.errored.push(TestFailure {
                    id: id.clone(),
                    message: "no tests collected".to_string(),
                    traceback: String::new(),
                });
            }
        }
        if outcome.is_empty() || (code == Some(1) && outcome.all_passed()) {
            tracing::warn!(code = ?code, "runner finished without a readable summary");
            return Err(RunnerError::Unparseable);
        }
        tracing::info!(
            passed = outcome.passed.len(),
            failed = outcome.failed.len(),
            errored = outcome.errored.len(),
            "test run finished"
        );
        Ok(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Repo(#[from] BuildError),
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// RunImpactedTests with the repository's configured runner command.
/// `timeout_secs` defaults to `runner.timeout_secs`.
pub fn run_impacted_tests(
    repo_path: &Path,
    test_ids: &[String],
    timeout_secs: Option<u64>,
) -> Result<TestRunOutcome, RunError> {
    let repo = Repo::open(repo_path)?;
    let timeout = Duration::from_secs(timeout_secs.unwrap_or(repo.config.runner.timeout_secs));
    let runner = SubprocessRunner::from_config(&repo.config.runner);
    Ok(runner.run(&repo.root, test_ids, timeout)?)
}

pub(crate) struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub(crate) enum ProcessError {
    Spawn(std::io::Error),
    Timeout,
}

/// Spawn `command`, optionally feed `stdin`, and wait until it exits or the
/// deadline passes. On timeout the child is killed and reaped.
pub(crate) fn run_process(
    mut command: Command,
    stdin: Option<&str>,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, ProcessError> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command.spawn().map_err(ProcessError::Spawn)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.to_string();
        // a child that exits without reading its input is not an error here
        std::thread::spawn(move || {
            let _ = pipe.write_all(input.as_bytes());
        });
    }
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait(&mut child, timeout)?;
    Ok(ProcessOutput {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, ProcessError> {
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => return Err(ProcessError::Spawn(e)),
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Timeout);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    let mut pipe = pipe?;
    Some(std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }))
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
