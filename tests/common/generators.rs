/// Project generators for benchmarks and large-scale tests.
use std::fmt::Write;

/// A layered Python project: `pkg/mod_{i}.py` defines `func_{i}_{j}`, each
/// calling the same-numbered function of the previous module, and
/// `tests/test_mod_{i}.py` tests every function of its module by name.
///
/// Returns `(relative_path, content)` pairs.
#[allow(dead_code)]
pub fn layered_project(modules: usize, fns_per_module: usize) -> Vec<(String, String)> {
    let mut files = Vec::with_capacity(modules * 2 + 1);
    files.push(("pkg/__init__.py".to_string(), String::new()));

    for i in 0..modules {
        let mut source = String::new();
        if i > 0 {
            writeln!(source, "from pkg.mod_{} import *\n", i - 1).unwrap();
        }
        for j in 0..fns_per_module {
            writeln!(source, "def func_{i}_{j}(x):").unwrap();
            if i > 0 {
                writeln!(source, "    return func_{}_{j}(x) + 1\n", i - 1).unwrap();
            } else {
                writeln!(source, "    return x\n").unwrap();
            }
        }
        files.push((format!("pkg/mod_{i}.py"), source));

        let mut tests = String::new();
        writeln!(tests, "from pkg.mod_{i} import *\n").unwrap();
        for j in 0..fns_per_module {
            writeln!(tests, "def test_func_{i}_{j}():").unwrap();
            writeln!(tests, "    assert func_{i}_{j}(0) == {i}\n").unwrap();
        }
        files.push((format!("tests/test_mod_{i}.py"), tests));
    }
    files
}
