//! Pytest conventions for test files, test classes and test functions.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Pytest fixture module.
pub const SUPPORT_FILE: &str = "conftest.py";

/// Matches repo-relative paths against the configured test-file globs.
#[derive(Debug, Clone)]
pub struct TestMatcher {
    globs: GlobSet,
}

impl TestMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            globs: builder.build()?,
        })
    }

    /// Build from patterns, skipping (and logging) any invalid glob.
    pub fn lenient(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!(pattern = %pattern, error = %e, "ignoring invalid test pattern"),
            }
        }
        Self {
            globs: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    /// `conftest.py` holds fixtures and is never a test file, even under `tests/`.
    pub fn is_test_file(&self, file_path: &str) -> bool {
        let name = file_path.rsplit('/').next().unwrap_or(file_path);
        name != SUPPORT_FILE && self.globs.is_match(file_path)
    }
}

/// `test_add`, `test`, `add_test`.
pub fn is_test_function_name(name: &str) -> bool {
    name.starts_with("test") || name.ends_with("_test")
}

/// `TestParser`; pytest collects classes with a `Test` prefix.
pub fn is_test_class_name(name: &str) -> bool {
    name.starts_with("Test")
}

/// Subject name a test is named after: `test_add` and `add_test` both give `add`.
pub fn tested_name(test_name: &str) -> Option<&str> {
    let subject = test_name
        .strip_prefix("test_")
        .or_else(|| test_name.strip_suffix("_test"))?;
    let subject = subject.trim_start_matches('_');
    (!subject.is_empty()).then_some(subject)
}

/// Subject class a test class is named after: `TestParser` gives `Parser`.
pub fn tested_class_name(class_name: &str) -> Option<&str> {
    let subject = class_name.strip_prefix("Test")?;
    let subject = subject.trim_start_matches('_');
    (!subject.is_empty()).then_some(subject)
}
