// A syntax error in one file never costs the rest of the graph.

use ripple_core::cancel::CancellationToken;
use ripple_core::store::GraphStore;
use ripple_core::types::NodeKind;
use ripple_impact::engine::{BuildRequest, ImpactEngine};

use super::common;

#[test]
fn test_nine_of_ten_files_indexed() {
    let mut files: Vec<(String, String)> = (0..9)
        .map(|i| {
            (
                format!("pkg/good_{i}.py"),
                format!("def helper_{i}(x):\n    return x * {i}\n"),
            )
        })
        .collect();
    files.push((
        "pkg/broken.py".to_string(),
        "def broken(:\n    return\n".to_string(),
    ));
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let dir = common::create_project(&refs);

    let engine = ImpactEngine::new(4);
    let request = BuildRequest::new(dir.path()).with_commit("c1");
    let report = engine.build_graph(&request, &CancellationToken::new()).unwrap();

    assert_eq!(report.partial_files.len(), 1);
    assert_eq!(report.partial_files[0].file_path(), "pkg/broken.py");

    let snapshot = engine.snapshot(&request, &CancellationToken::new()).unwrap();
    for i in 0..9 {
        let path = format!("pkg/good_{i}.py");
        let functions = snapshot
            .graph
            .nodes_in_file(&path)
            .into_iter()
            .filter(|n| n.kind == NodeKind::Function)
            .count();
        assert_eq!(functions, 1, "{path} lost its function");
    }
    let broken = snapshot.graph.file_node("pkg/broken.py").unwrap();
    assert!(broken.partial);
    common::assert_no_dangling_edges(&snapshot);
}
