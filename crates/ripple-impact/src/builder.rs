//! Build one snapshot: walk, parse, insert, resolve, link.
//!
//! With a previous snapshot the build is incremental. Its graph is cloned,
//! the subgraphs of changed and removed files are replaced, files that
//! reach them through edges or import chains are re-resolved, and linking
//! runs again over the whole graph. The previous snapshot is never touched.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::time::Instant;

use ripple_core::cancel::CancellationToken;
use ripple_core::config::RippleConfig;
use ripple_core::coverage::CoverageData;
use ripple_core::graph::CodeGraph;
use ripple_core::hash::file_node_id;
use ripple_core::store::GraphStore;
use ripple_core::types::{EdgeDirection, EdgeKind, GraphEdge, GraphNode, NodeKind};
use ripple_parsers::pool::{parse_files, ParseOutcome};
use ripple_parsers::python::{module_name_from_rel_path, PyResolver};
use ripple_parsers::resolver::{LanguageResolver, ParsedFile};
use ripple_parsers::test_detection::TestMatcher;
use ripple_parsers::walker::FileWalker;

use crate::linker;
use crate::resolve::{def_node_id, def_node_kind, imported_module_names, Resolver};
use crate::snapshot::{BuildStats, FileRecord, Snapshot};
use crate::types::BuildError;

/// Everything a build needs besides cancellation.
pub struct BuildInput<'a> {
    pub root: &'a Path,
    pub repo_id: &'a str,
    pub commit_id: &'a str,
    pub config: &'a RippleConfig,
    /// Base for an incremental build; `None` builds from scratch.
    pub previous: Option<&'a Snapshot>,
    pub coverage: Option<&'a CoverageData>,
}

pub fn build_snapshot(
    input: &BuildInput<'_>,
    cancel: &CancellationToken,
) -> Result<Snapshot, BuildError> {
    let started = Instant::now();
    let _span = tracing::info_span!(
        "build_snapshot",
        repo = input.repo_id,
        commit = input.commit_id
    )
    .entered();

    if !input.root.is_dir() {
        return Err(BuildError::InvalidRepo {
            path: input.root.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }

    let config = input.config;
    let resolver = PyResolver::new(TestMatcher::lenient(&config.test_patterns));
    let files: Vec<String> = FileWalker::new(input.root)
        .with_ignore_patterns(&config.ignore_patterns)
        .walk()
        .into_iter()
        .filter(|e| resolver.handles(&e.rel_path))
        .map(|e| e.rel_path)
        .collect();
    cancel.check()?;

    let known_hashes: HashMap<String, String> = input
        .previous
        .map(|prev| {
            prev.files
                .iter()
                .filter_map(|(path, r)| Some((path.clone(), r.content_hash.clone()?)))
                .collect()
        })
        .unwrap_or_default();

    let outcomes = parse_files(
        &resolver,
        input.root,
        &files,
        &known_hashes,
        config.effective_workers(),
        cancel,
    )?;

    let mut records: BTreeMap<String, FileRecord> = BTreeMap::new();
    let mut changed: BTreeSet<String> = BTreeSet::new();
    let mut files_reused = 0;
    for outcome in outcomes {
        let path = outcome.file_path().to_string();
        let record = match outcome {
            ParseOutcome::Unchanged { .. } => {
                let Some(prev) = input.previous.and_then(|p| p.files.get(&path)) else {
                    tracing::warn!(file = %path, "unchanged file missing from previous snapshot");
                    continue;
                };
                files_reused += 1;
                records.insert(path, prev.clone());
                continue;
            }
            ParseOutcome::Parsed(parsed) => FileRecord::parsed(parsed),
            ParseOutcome::Failed {
                failure,
                content_hash,
            } => FileRecord::failed(failure, content_hash),
        };
        changed.insert(path.clone());
        records.insert(path, record);
    }

    let removed: BTreeSet<String> = input
        .previous
        .map(|prev| {
            prev.files
                .keys()
                .filter(|p| !records.contains_key(*p))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let affected: BTreeSet<String> = changed.union(&removed).cloned().collect();

    let generation = input.previous.map_or(1, |p| p.generation + 1);
    let mut graph = input
        .previous
        .map(|p| p.graph.clone())
        .unwrap_or_default();

    let dependents = if input.previous.is_some() {
        dependent_files(&graph, &records, &affected)
    } else {
        BTreeSet::new()
    };
    tracing::debug!(
        changed = changed.len(),
        removed = removed.len(),
        dependents = dependents.len(),
        "files to re-index"
    );

    for path in &affected {
        graph.remove_subgraph(path);
    }
    for path in &dependents {
        graph.remove_edges_from_file(path, &EdgeKind::STRUCTURAL);
    }
    graph.remove_edges_of_kind(&EdgeKind::LINKS);
    cancel.check()?;

    insert_file_nodes(&mut graph, &records, &changed, input.commit_id, generation)?;

    let index = Resolver::new(&records);
    let mut unresolved: Vec<_> = input
        .previous
        .map(|prev| {
            prev.unresolved
                .iter()
                .filter(|u| !affected.contains(&u.file_path) && !dependents.contains(&u.file_path))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let mut edges = Vec::new();
    let mut dropped_references = 0;
    for path in changed.iter().chain(&dependents) {
        cancel.check()?;
        let resolved = index.resolve_file(path, generation);
        edges.extend(resolved.edges);
        unresolved.extend(resolved.unresolved);
        dropped_references += resolved.dropped_calls;
    }
    unresolved.sort_by(|a, b| (&a.file_path, a.line, &a.name).cmp(&(&b.file_path, b.line, &b.name)));
    graph.insert_edges(edges)?;
    cancel.check()?;

    let linked = linker::link(&graph, input.coverage, &config.linker, generation);
    graph.insert_edges(linked.edges)?;
    cancel.check()?;

    let snapshot = Snapshot {
        repo_id: input.repo_id.to_string(),
        commit_id: input.commit_id.to_string(),
        generation,
        graph,
        files: records,
        unresolved,
        ambiguities: linked.ambiguities,
        stats: BuildStats {
            files_parsed: changed.len(),
            files_reused,
            dropped_references,
            build_time_ms: started.elapsed().as_millis() as u64,
            incremental: input.previous.is_some(),
        },
    };
    tracing::info!(
        generation,
        nodes = snapshot.node_count(),
        edges = snapshot.edge_count(),
        parsed = snapshot.stats.files_parsed,
        reused = files_reused,
        partial = snapshot.partial_files().len(),
        ms = snapshot.stats.build_time_ms,
        "graph built"
    );
    Ok(snapshot)
}

/// Unchanged files whose resolution may depend on an affected file: they
/// have edges into it, or import it directly or through any chain of
/// importing modules (re-exports resolve through the chain).
fn dependent_files(
    graph: &CodeGraph,
    records: &BTreeMap<String, FileRecord>,
    affected: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for path in affected {
        for node in graph.nodes_in_file(path) {
            for kind in EdgeKind::STRUCTURAL {
                for (_, edge) in graph.neighbors(node.id, kind, EdgeDirection::Incoming) {
                    if !affected.contains(&edge.file_path) {
                        out.insert(edge.file_path.clone());
                    }
                }
            }
        }
    }
    out.retain(|p| records.contains_key(p));

    let mut modules: BTreeSet<String> = BTreeSet::new();
    for path in affected.iter().chain(&out) {
        add_module_names(&mut modules, path);
    }

    let importers: Vec<(&String, Vec<String>)> = records
        .iter()
        .filter(|(path, _)| !affected.contains(*path))
        .filter_map(|(path, record)| Some((path, imported_module_names(record.parsed.as_ref()?))))
        .collect();
    loop {
        let mut grew = false;
        for (path, imports) in &importers {
            if out.contains(*path) || !imports.iter().any(|m| modules.contains(m)) {
                continue;
            }
            out.insert((*path).clone());
            add_module_names(&mut modules, path);
            grew = true;
        }
        if !grew {
            break;
        }
    }
    out
}

fn add_module_names(modules: &mut BTreeSet<String>, path: &str) {
    let module = module_name_from_rel_path(path);
    if let Some(stripped) = module.strip_prefix("src.") {
        modules.insert(stripped.to_string());
    }
    modules.insert(module);
}

fn insert_file_nodes(
    graph: &mut CodeGraph,
    records: &BTreeMap<String, FileRecord>,
    changed: &BTreeSet<String>,
    revision: &str,
    generation: u64,
) -> Result<(), BuildError> {
    let mut nodes = Vec::new();
    let mut contains = Vec::new();
    for path in changed {
        let Some(record) = records.get(path) else {
            continue;
        };
        let file_id = file_node_id(path);
        nodes.push(file_node(path, record, revision, generation));
        let Some(parsed) = &record.parsed else {
            continue;
        };
        for def in &parsed.definitions {
            let id = def_node_id(path, def);
            nodes.push(GraphNode {
                id,
                kind: def_node_kind(def),
                name: def.name.clone(),
                qualified_name: def.qualified_name.clone(),
                file_path: path.clone(),
                line_start: def.line_start,
                line_end: def.line_end,
                params: def.params.clone(),
                doc_summary: def.doc_summary.clone(),
                content_hash: None,
                revision: None,
                partial: false,
                is_test_file: parsed.is_test_file,
                generation,
            });
            contains.push(GraphEdge::structural(
                file_id,
                id,
                EdgeKind::Contains,
                path,
                def.line_start,
                generation,
            ));
        }
    }
    graph.insert_nodes(nodes)?;
    graph.insert_edges(contains)?;
    Ok(())
}

fn file_node(path: &str, record: &FileRecord, revision: &str, generation: u64) -> GraphNode {
    let parsed: Option<&ParsedFile> = record.parsed.as_ref();
    GraphNode {
        id: file_node_id(path),
        kind: NodeKind::File,
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        qualified_name: parsed
            .map(|p| p.module.clone())
            .unwrap_or_else(|| module_name_from_rel_path(path)),
        file_path: path.to_string(),
        line_start: 1,
        line_end: parsed.map_or(1, |p| p.line_count),
        params: Vec::new(),
        doc_summary: None,
        content_hash: record.content_hash.clone(),
        revision: Some(revision.to_string()),
        partial: record.is_partial(),
        is_test_file: parsed.is_some_and(|p| p.is_test_file),
        generation,
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
