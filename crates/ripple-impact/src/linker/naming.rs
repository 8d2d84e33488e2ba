use ripple_core::types::LinkStrategy;
use ripple_parsers::test_detection::{tested_class_name, tested_name};

use super::{CandidateEdge, LinkContext, LinkingStrategy, NAMING_CONFIDENCE};

/// `test_<name>` / `<name>_test` links to `<name>` in the test's own module,
/// a module it imports, or the module its file is named after. Methods of
/// `Test<Name>` also link to class `<Name>` and to `<Name>.<name>`.
pub struct NamingStrategy;

impl LinkingStrategy for NamingStrategy {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::Naming
    }

    fn candidates(&self, ctx: &LinkContext<'_>) -> Vec<CandidateEdge> {
        let mut out = Vec::new();
        for test in ctx.tests() {
            let subject = tested_name(&test.name);
            let class_subject = test
                .qualified_name
                .rsplit_once('.')
                .map(|(parent, _)| parent.rsplit('.').next().unwrap_or(parent))
                .and_then(tested_class_name);

            let mut wanted: Vec<String> = Vec::new();
            if let Some(name) = subject {
                wanted.push(name.to_string());
            }
            if let Some(class) = class_subject {
                wanted.push(class.to_string());
                if let Some(name) = subject {
                    wanted.push(format!("{class}.{name}"));
                }
            }
            if wanted.is_empty() {
                continue;
            }

            let mut scope = vec![test.file_path.as_str()];
            scope.extend(ctx.imported_files(&test.file_path));
            scope.extend(ctx.subject_file(&test.file_path));
            scope.sort_unstable();
            scope.dedup();
            for file in scope {
                for node in ctx.code_nodes(file) {
                    if wanted.iter().any(|w| *w == node.qualified_name) {
                        out.push(CandidateEdge {
                            test: test.id,
                            target: node.id,
                            confidence: NAMING_CONFIDENCE,
                            strategy: LinkStrategy::Naming,
                        });
                    }
                }
            }
        }
        out
    }
}
