// Incremental rebuilds must converge on the graph a full build produces.

use std::fs;

use ripple_core::cancel::CancellationToken;
use ripple_impact::engine::{BuildRequest, ImpactEngine};

use super::common;

const UTIL_PY: &str = "def clamp(x, lo, hi):\n    return max(lo, min(x, hi))\n";
const CALC_PY: &str = "from util import clamp\n\n\ndef scale(x):\n    return clamp(x * 2, 0, 10)\n";
const TEST_CALC_PY: &str =
    "from calc import scale\n\n\ndef test_scale():\n    assert scale(3) == 6\n";

#[test]
fn test_incremental_equals_full() {
    let dir = common::create_project(&[
        ("util.py", UTIL_PY),
        ("calc.py", CALC_PY),
        ("test_calc.py", TEST_CALC_PY),
    ]);
    let engine = ImpactEngine::new(8);
    let cancel = CancellationToken::new();
    engine
        .build_graph(&BuildRequest::new(dir.path()).with_commit("c1"), &cancel)
        .unwrap();

    // edit one file, add one, remove none
    fs::write(
        dir.path().join("util.py"),
        "def clamp(x, lo, hi):\n    return lo if x < lo else min(x, hi)\n\n\ndef double(x):\n    return 2 * x\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("calc.py"),
        "from util import clamp, double\n\n\ndef scale(x):\n    return clamp(double(x), 0, 10)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("test_util.py"),
        "from util import double\n\n\ndef test_double():\n    assert double(2) == 4\n",
    )
    .unwrap();

    let c2 = BuildRequest::new(dir.path()).with_commit("c2");
    let report = engine.build_graph(&c2, &cancel).unwrap();
    assert!(!report.cache_hit);
    assert_eq!(report.files_parsed, 3);
    assert_eq!(report.files_reused, 1);
    let incremental = engine.snapshot(&c2, &cancel).unwrap();

    let fresh = ImpactEngine::new(8);
    let full = fresh
        .snapshot(&BuildRequest::new(dir.path()).with_commit("c2").forced(true), &cancel)
        .unwrap();

    assert_eq!(common::node_identities(&incremental), common::node_identities(&full));
    assert_eq!(common::edge_identities(&incremental), common::edge_identities(&full));
    common::assert_no_dangling_edges(&incremental);
    assert_eq!(incremental.generation, 2);
}

#[test]
fn test_removed_file_leaves_no_edges() {
    let dir = common::create_project(&[
        ("util.py", UTIL_PY),
        ("calc.py", CALC_PY),
        ("test_calc.py", TEST_CALC_PY),
    ]);
    let engine = ImpactEngine::new(8);
    let cancel = CancellationToken::new();
    engine
        .build_graph(&BuildRequest::new(dir.path()).with_commit("c1"), &cancel)
        .unwrap();

    fs::remove_file(dir.path().join("util.py")).unwrap();
    let snapshot = engine
        .snapshot(&BuildRequest::new(dir.path()).with_commit("c2"), &cancel)
        .unwrap();

    assert!(!snapshot.contains_file("util.py"));
    assert!(snapshot.graph.nodes().all(|n| n.file_path != "util.py"));
    common::assert_no_dangling_edges(&snapshot);
}
