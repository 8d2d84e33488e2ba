// Nodes and edges produced for a small package with inheritance,
// relative imports and a test class.

use ripple_core::cancel::CancellationToken;
use ripple_core::hash::{file_node_id, node_id};
use ripple_core::types::{EdgeKind, LinkStrategy, NodeKind};
use ripple_impact::engine::{BuildRequest, ImpactEngine, ImpactRequest};

use super::common;

const BASE_PY: &str = "\
class Base:
    def run(self):
        return self.step()

    def step(self):
        return 1
";

const PARSER_PY: &str = "\
from .base import Base


class Parser(Base):
    def parse(self, text):
        return self.run() + len(text)
";

const TEST_PARSER_PY: &str = "\
from pkg.parser import Parser


class TestParser:
    def test_parse(self):
        assert Parser().parse(\"ab\") == 3
";

fn project() -> tempfile::TempDir {
    common::create_project(&[
        ("pkg/__init__.py", ""),
        ("pkg/base.py", BASE_PY),
        ("pkg/parser.py", PARSER_PY),
        ("tests/test_parser.py", TEST_PARSER_PY),
    ])
}

#[test]
fn test_structural_edges() {
    let dir = project();
    let snapshot = ImpactEngine::new(4)
        .snapshot(&BuildRequest::new(dir.path()).with_commit("c1"), &CancellationToken::new())
        .unwrap();
    let graph = &snapshot.graph;

    let base = node_id(NodeKind::Class, "pkg/base.py", "Base");
    let run = node_id(NodeKind::Function, "pkg/base.py", "Base.run");
    let step = node_id(NodeKind::Function, "pkg/base.py", "Base.step");
    let parser = node_id(NodeKind::Class, "pkg/parser.py", "Parser");
    let parse = node_id(NodeKind::Function, "pkg/parser.py", "Parser.parse");

    for id in [base, run, step, parser, parse] {
        assert!(graph.contains_node(id));
    }
    assert!(graph.edge(parser, base, EdgeKind::Inherits).is_some());
    assert!(graph
        .edge(file_node_id("pkg/parser.py"), file_node_id("pkg/base.py"), EdgeKind::Imports)
        .is_some());
    assert!(graph
        .edge(file_node_id("pkg/base.py"), run, EdgeKind::Contains)
        .is_some());
    assert!(graph.edge(run, step, EdgeKind::Calls).is_some());
    // self.run() resolves through the base class
    assert!(graph.edge(parse, run, EdgeKind::Calls).is_some());
    common::assert_no_dangling_edges(&snapshot);
}

#[test]
fn test_test_class_links_by_name() {
    let dir = project();
    let snapshot = ImpactEngine::new(4)
        .snapshot(&BuildRequest::new(dir.path()).with_commit("c1"), &CancellationToken::new())
        .unwrap();

    let test = node_id(NodeKind::Test, "tests/test_parser.py", "TestParser.test_parse");
    let test_node = snapshot.graph.nodes().find(|n| n.id == test).unwrap();
    assert_eq!(test_node.test_id(), "tests/test_parser.py::TestParser::test_parse");

    for target in [
        node_id(NodeKind::Function, "pkg/parser.py", "Parser.parse"),
        node_id(NodeKind::Class, "pkg/parser.py", "Parser"),
    ] {
        let link = snapshot.graph.edge(test, target, EdgeKind::Tests).unwrap();
        assert_eq!(link.confidence, 1.0);
        assert_eq!(link.strategy, Some(LinkStrategy::Naming));
    }
}

#[test]
fn test_base_change_reaches_test_one_hop_out() {
    let dir = project();
    let impacted = ImpactEngine::new(4)
        .get_impacted_tests(
            &ImpactRequest {
                repo_path: dir.path().to_path_buf(),
                commit_id: Some("c1".to_string()),
                changed_files: vec!["pkg/base.py".to_string()],
                threshold: Some(0.5),
                max_results: None,
            },
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(impacted.len(), 1);
    assert_eq!(impacted[0].test_id, "tests/test_parser.py::TestParser::test_parse");
    assert!((impacted[0].score - 0.7).abs() < 1e-9, "{}", impacted[0].score);
}
