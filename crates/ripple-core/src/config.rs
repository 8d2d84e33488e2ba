//! Configuration file loading for ripple.
//!
//! Reads `.ripple/ripple.json` and provides typed access to all settings.
//! Falls back to sensible defaults when the config file is missing or incomplete.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Directory inside a repository that holds ripple's config and cache.
pub const RIPPLE_DIR: &str = ".ripple";
const CONFIG_FILE: &str = "ripple.json";

/// Top-level ripple configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RippleConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub linker: LinkerConfig,
    #[serde(default)]
    pub impact: ImpactConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub fix: FixConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Globs (relative to the repo root) that mark a file as a test file.
    #[serde(default = "default_test_patterns")]
    pub test_patterns: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Parse worker threads; 0 means one per available core.
    #[serde(default)]
    pub parse_workers: usize,
}

/// Test linker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Hops followed from a test body by the call-graph strategy.
    #[serde(default = "default_link_call_depth")]
    pub call_depth: u32,
    /// Coverage JSON (`{test_id: {file: {line: hits}}}`), relative to the repo root.
    #[serde(default)]
    pub coverage_file: Option<String>,
}

/// Impact query defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Reverse CALLS hops followed from a changed definition.
    #[serde(default = "default_impact_call_depth")]
    pub call_depth: u32,
    /// Multiplier applied per reverse CALLS hop.
    #[serde(default = "default_decay")]
    pub decay: f64,
}

/// External test runner invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Program and leading arguments; test ids are appended.
    #[serde(default = "default_runner_command")]
    pub command: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Iterative fix loop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Extra attempts after a runner crash or timeout.
    #[serde(default = "default_runner_retries")]
    pub runner_retries: u32,
    /// Traceback lines kept per failed test in agent feedback.
    #[serde(default = "default_traceback_lines")]
    pub traceback_lines: usize,
    /// Agent command; receives the prompt on stdin.
    #[serde(default)]
    pub agent_command: Vec<String>,
}

/// Snapshot cache tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    /// Persist snapshots to `.ripple/snapshots.db`.
    #[serde(default = "default_true")]
    pub persist: bool,
}

fn default_version() -> String {
    "1".to_string()
}
fn default_true() -> bool {
    true
}
fn default_test_patterns() -> Vec<String> {
    vec![
        "**/test_*.py".to_string(),
        "**/*_test.py".to_string(),
        "**/tests/**/*.py".to_string(),
    ]
}
fn default_link_call_depth() -> u32 {
    2
}
fn default_threshold() -> f64 {
    0.5
}
fn default_max_results() -> usize {
    50
}
fn default_impact_call_depth() -> u32 {
    3
}
fn default_decay() -> f64 {
    0.7
}
fn default_runner_command() -> Vec<String> {
    ["python", "-m", "pytest", "-rA", "--tb=short", "-q", "-p", "no:cacheprovider"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_iterations() -> u32 {
    3
}
fn default_runner_retries() -> u32 {
    1
}
fn default_traceback_lines() -> usize {
    12
}
fn default_memory_capacity() -> usize {
    8
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            call_depth: default_link_call_depth(),
            coverage_file: None,
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_results: default_max_results(),
            call_depth: default_impact_call_depth(),
            decay: default_decay(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            runner_retries: default_runner_retries(),
            traceback_lines: default_traceback_lines(),
            agent_command: vec![],
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: default_memory_capacity(),
            persist: true,
        }
    }
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            linker: LinkerConfig::default(),
            impact: ImpactConfig::default(),
            runner: RunnerConfig::default(),
            fix: FixConfig::default(),
            cache: CacheConfig::default(),
            test_patterns: default_test_patterns(),
            ignore_patterns: vec![],
            parse_workers: 0,
        }
    }
}

/// Errors raised when writing a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RippleConfig {
    /// Load configuration from `ripple.json` inside the given `.ripple` directory.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(ripple_dir: &Path) -> Self {
        let config_path = ripple_dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load the config belonging to a repository root.
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::load(&repo_root.join(RIPPLE_DIR))
    }

    /// Write this config as pretty JSON, creating the directory if needed.
    pub fn save(&self, ripple_dir: &Path) -> Result<(), ConfigError> {
        let path = ripple_dir.join(CONFIG_FILE);
        let write_err = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(ripple_dir).map_err(write_err)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(write_err)?;
        Ok(())
    }

    /// Number of parse threads to use.
    pub fn effective_workers(&self) -> usize {
        if self.parse_workers > 0 {
            return self.parse_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
