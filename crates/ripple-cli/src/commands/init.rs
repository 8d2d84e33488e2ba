use std::fs;
use std::path::Path;

use ripple_core::config::{RippleConfig, RIPPLE_DIR};

const GITIGNORE_ENTRY: &str = ".ripple/snapshots.db";

/// Run `ripple init`: create `.ripple/` with a default `ripple.json`.
pub fn run(repo: &Path, verbose: bool) -> i32 {
    if !repo.is_dir() {
        eprintln!("ripple init: {} is not a directory", repo.display());
        return 2;
    }
    let ripple_dir = repo.join(RIPPLE_DIR);
    if ripple_dir.exists() {
        eprintln!("ripple init: .ripple/ directory already exists");
        return 2;
    }

    if let Err(e) = RippleConfig::default().save(&ripple_dir) {
        eprintln!("ripple init: {e}");
        return 2;
    }
    ignore_snapshot_db(repo, verbose);

    if verbose {
        eprintln!("ripple init: initialized in {}", repo.display());
    }
    0
}

/// Keep the snapshot database out of version control when a .gitignore exists.
fn ignore_snapshot_db(repo: &Path, verbose: bool) {
    let path = repo.join(".gitignore");
    let Ok(existing) = fs::read_to_string(&path) else {
        return;
    };
    if existing.lines().any(|l| l.trim() == GITIGNORE_ENTRY) {
        return;
    }
    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(GITIGNORE_ENTRY);
    content.push('\n');
    match fs::write(&path, content) {
        Ok(()) if verbose => eprintln!("ripple init: added {GITIGNORE_ENTRY} to .gitignore"),
        Ok(()) => {}
        Err(e) => eprintln!("ripple init: could not update .gitignore: {e}"),
    }
}
