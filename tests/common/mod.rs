/// Shared test helpers for ripple integration tests.
///
/// Import from any integration test file with:
///   `#[path = "common/mod.rs"] mod common;`
pub mod generators;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use ripple_core::types::NodeKind;
use ripple_impact::snapshot::Snapshot;

pub const MOD_PY: &str = "def add(a, b):\n    return a + b\n";
pub const TEST_MOD_PY: &str =
    "from mod import add\n\n\ndef test_add():\n    assert add(1, 2) == 3\n";

/// Write `files` under a fresh temporary directory.
///
/// Each entry is `(relative_path, content)`. Hold the TempDir to keep the
/// directory alive.
#[allow(dead_code)]
pub fn create_project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_files(dir.path(), files);
    dir
}

#[allow(dead_code)]
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full_path = root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }
}

/// The two-file project: `mod.py` defines `add`, `test_mod.py` tests it.
#[allow(dead_code)]
pub fn scenario_project() -> TempDir {
    create_project(&[("mod.py", MOD_PY), ("test_mod.py", TEST_MOD_PY)])
}

/// Every edge endpoint exists in the graph.
#[allow(dead_code)]
pub fn assert_no_dangling_edges(snapshot: &Snapshot) {
    for edge in snapshot.graph.edges() {
        assert!(
            snapshot.graph.contains_node(edge.source) && snapshot.graph.contains_node(edge.target),
            "dangling {} edge {} -> {}",
            edge.kind,
            edge.source,
            edge.target
        );
    }
}

/// Sorted `(kind, file, qualified name)` of every node, for comparing graphs.
#[allow(dead_code)]
pub fn node_identities(snapshot: &Snapshot) -> Vec<(NodeKind, String, String)> {
    let mut ids: Vec<_> = snapshot
        .graph
        .nodes()
        .map(|n| (n.kind, n.file_path.clone(), n.qualified_name.clone()))
        .collect();
    ids.sort();
    ids
}

/// Sorted `(kind, source, target, confidence)` of every edge.
#[allow(dead_code)]
pub fn edge_identities(snapshot: &Snapshot) -> Vec<(String, u64, u64, String)> {
    let mut ids: Vec<_> = snapshot
        .graph
        .edges()
        .map(|e| {
            (
                e.kind.to_string(),
                e.source,
                e.target,
                format!("{:.3}", e.confidence),
            )
        })
        .collect();
    ids.sort();
    ids
}

/// Path to the compiled `ripple` binary.
/// Builds the binary if it doesn't exist yet.
#[allow(dead_code)]
pub fn ripple_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove 'deps'
    path.push("ripple");
    if path.exists() {
        return path;
    }
    let workspace = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let status = Command::new("cargo")
        .args(["build", "-p", "ripple-cli"])
        .current_dir(&workspace)
        .status()
        .expect("Failed to build ripple");
    assert!(status.success(), "Failed to build ripple binary");
    path
}

/// A runner command that passes every id when `needle` occurs in `file`,
/// and fails every id otherwise. Stands in for pytest.
#[allow(dead_code)]
pub fn grep_runner(needle: &str, file: &str) -> Vec<String> {
    let script = format!(
        "if grep -q '{needle}' {file}; then for id in \"$@\"; do echo \"PASSED $id\"; done; \
         else for id in \"$@\"; do echo \"FAILED $id - assert wrong result\"; done; exit 1; fi"
    );
    vec!["sh".to_string(), "-c".to_string(), script, "sh".to_string()]
}
