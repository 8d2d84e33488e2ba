//! The external coding agent that proposes candidate fixes.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::runner::{run_process, ProcessError};

/// A candidate fix, already applied to the working tree by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Files the candidate touched; empty means "ask the diff provider".
    #[serde(default)]
    pub changed_files: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("no agent command configured")]
    NotConfigured,
    #[error("failed to start agent: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("agent exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("agent gave up: {0}")]
    GaveUp(String),
}

pub trait FixAgent {
    /// Produce and apply the next candidate for `prompt`.
    fn propose(&mut self, prompt: &str) -> Result<Candidate, AgentError>;
}

/// Runs an external command per candidate: the prompt goes to stdin and
/// every non-empty stdout line naming a file is taken as a changed file.
pub struct CommandAgent {
    command: Vec<String>,
    workdir: PathBuf,
}

impl CommandAgent {
    pub fn new(command: Vec<String>, workdir: &Path) -> Result<Self, AgentError> {
        if command.is_empty() {
            return Err(AgentError::NotConfigured);
        }
        Ok(Self {
            command,
            workdir: workdir.to_path_buf(),
        })
    }
}

impl FixAgent for CommandAgent {
    fn propose(&mut self, prompt: &str) -> Result<Candidate, AgentError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(AgentError::NotConfigured);
        };
        let mut command = Command::new(program);
        command.args(args).current_dir(&self.workdir);

        let output = run_process(command, Some(prompt), None).map_err(|e| match e {
            ProcessError::Spawn(e) => AgentError::Spawn(e),
            ProcessError::Timeout => AgentError::GaveUp("timed out".to_string()),
        })?;
        if !output.status.success() {
            return Err(AgentError::Failed {
                code: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        let changed_files: Vec<String> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && self.workdir.join(l).exists())
            .map(str::to_string)
            .collect();
        tracing::debug!(files = changed_files.len(), "agent produced a candidate");
        Ok(Candidate {
            changed_files,
            summary: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, dir: &Path) -> CommandAgent {
        CommandAgent::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            dir,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_command_is_not_configured() {
        assert!(matches!(
            CommandAgent::new(vec![], Path::new(".")),
            Err(AgentError::NotConfigured)
        ));
    }

    #[test]
    fn test_prompt_on_stdin_and_files_on_stdout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calc.py"), "x = 1\n").unwrap();
        let mut agent = sh("cat > prompt.txt; echo calc.py; echo 'thinking...'", dir.path());
        let candidate = agent.propose("fix it").unwrap();
        assert_eq!(candidate.changed_files, vec!["calc.py"]);
        let prompt = std::fs::read_to_string(dir.path().join("prompt.txt")).unwrap();
        assert_eq!(prompt, "fix it");
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = sh("echo nope >&2; exit 2", dir.path());
        match agent.propose("fix it") {
            Err(AgentError::Failed { code, stderr }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
