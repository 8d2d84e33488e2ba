mod extract;
mod helpers;

use std::path::Path;

use ripple_core::hash::content_hash;

use crate::resolver::{LanguageResolver, ParseFailure, ParsedFile};
use crate::test_detection::TestMatcher;
use crate::treesitter::{detect_language, first_error, start_line, TreeSitterParser};

pub use helpers::module_name_from_rel_path;

/// Structural resolver for Python sources.
///
/// Each call builds its own tree-sitter parser, so one resolver can serve the
/// whole parse pool without locking.
pub struct PyResolver {
    tests: TestMatcher,
}

impl PyResolver {
    pub fn new(tests: TestMatcher) -> Self {
        PyResolver { tests }
    }
}

impl LanguageResolver for PyResolver {
    fn language(&self) -> &str {
        "python"
    }

    fn handles(&self, file_path: &str) -> bool {
        detect_language(Path::new(file_path)) == Some("python")
    }

    fn module_name(&self, file_path: &str) -> String {
        module_name_from_rel_path(file_path)
    }

    fn parse_file(&self, file_path: &str, content: &[u8]) -> Result<ParsedFile, ParseFailure> {
        let source = std::str::from_utf8(content).map_err(|_| ParseFailure::Encoding {
            file_path: file_path.to_string(),
        })?;
        let mut parser = TreeSitterParser::new();
        let tree = parser
            .parse("python", content)
            .map_err(|e| ParseFailure::Parser {
                file_path: file_path.to_string(),
                message: e.to_string(),
            })?;
        let root = tree.root_node();
        if let Some(err) = first_error(root) {
            return Err(ParseFailure::Syntax {
                file_path: file_path.to_string(),
                line: start_line(err),
            });
        }

        let is_test_file = self.tests.is_test_file(file_path);
        let extracted = extract::extract(root, source, is_test_file);
        let file_name = Path::new(file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        Ok(ParsedFile {
            file_path: file_path.to_string(),
            module: module_name_from_rel_path(file_path),
            is_package: file_name == "__init__",
            content_hash: content_hash(content),
            is_test_file,
            line_count: source.lines().count().max(1) as u32,
            definitions: extracted.definitions,
            imports: extracted.imports,
            references: extracted.references,
        })
    }
}
