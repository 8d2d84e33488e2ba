//! Best-effort resolution of imports, calls and base classes.
//!
//! Anything that cannot be tied to a definition inside the snapshot
//! (dynamic dispatch, attributes of unknown receivers, third-party modules)
//! is dropped rather than guessed.

use std::collections::{BTreeMap, HashMap, HashSet};

use ripple_core::hash::{file_node_id, node_id};
use ripple_core::types::{EdgeKind, GraphEdge, NodeId, NodeKind, UnresolvedRef};
use ripple_parsers::python::module_name_from_rel_path;
use ripple_parsers::resolver::{Definition, DefinitionKind, Import, ParsedFile};

use crate::snapshot::FileRecord;

/// Callee defined in the calling module.
pub const SAME_MODULE: f64 = 0.95;
/// `self.method()` / `cls.method()` inside a class.
pub const SELF_METHOD: f64 = 0.9;
/// Name bound by an explicit import.
pub const EXPLICIT_IMPORT: f64 = 0.8;
/// Name found through `from m import *`.
pub const STAR_IMPORT: f64 = 0.5;

const MAX_DEPTH: u32 = 4;

/// Graph node kind for a parsed definition.
pub fn def_node_kind(def: &Definition) -> NodeKind {
    if def.is_test {
        return NodeKind::Test;
    }
    match def.kind {
        DefinitionKind::Function => NodeKind::Function,
        DefinitionKind::Class => NodeKind::Class,
    }
}

pub fn def_node_id(file_path: &str, def: &Definition) -> NodeId {
    node_id(def_node_kind(def), file_path, &def.qualified_name)
}

/// Absolute module named by an import, resolving leading dots against the
/// importing file's package.
pub fn absolute_module(file: &ParsedFile, import: &Import) -> Option<String> {
    if import.level == 0 {
        return (!import.module.is_empty()).then(|| import.module.clone());
    }
    let mut parts: Vec<&str> = file.module.split('.').collect();
    if !file.is_package {
        parts.pop();
    }
    for _ in 1..import.level {
        parts.pop()?;
    }
    if !import.module.is_empty() {
        parts.extend(import.module.split('.'));
    }
    (!parts.is_empty()).then(|| parts.join("."))
}

/// Every module a file could be importing, used to find files that must be
/// re-resolved when another file appears, changes or disappears.
pub fn imported_module_names(file: &ParsedFile) -> Vec<String> {
    let mut out = Vec::new();
    for import in &file.imports {
        let Some(base) = absolute_module(file, import) else {
            continue;
        };
        for name in &import.names {
            out.push(format!("{base}.{}", name.name));
        }
        out.push(base);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Module(String),
    Symbol { module: String, name: String },
}

#[derive(Debug, Default)]
struct FileScope {
    bindings: HashMap<String, Binding>,
    star_modules: Vec<String>,
    imported_modules: Vec<(String, u32)>,
}

/// A definition located in the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Found<'a> {
    pub file: &'a ParsedFile,
    pub def: &'a Definition,
}

impl Found<'_> {
    pub fn node_id(&self) -> NodeId {
        def_node_id(&self.file.file_path, self.def)
    }
}

enum Head<'a> {
    Def(Found<'a>),
    Module(String),
}

/// Edges and leftovers produced by resolving one file.
#[derive(Debug, Default)]
pub struct ResolvedFile {
    pub edges: Vec<GraphEdge>,
    pub unresolved: Vec<UnresolvedRef>,
    pub dropped_calls: usize,
}

/// Symbol index over every successfully parsed file of a snapshot.
pub struct Resolver<'a> {
    files: HashMap<&'a str, &'a ParsedFile>,
    modules: HashMap<String, &'a str>,
    scopes: HashMap<&'a str, FileScope>,
}

impl<'a> Resolver<'a> {
    pub fn new(records: &'a BTreeMap<String, FileRecord>) -> Self {
        let mut files = HashMap::new();
        let mut modules = HashMap::new();
        for (path, record) in records {
            let module = match &record.parsed {
                Some(parsed) => parsed.module.clone(),
                None => module_name_from_rel_path(path),
            };
            // `src/` layouts import without the prefix
            if let Some(stripped) = module.strip_prefix("src.") {
                modules.entry(stripped.to_string()).or_insert(path.as_str());
            }
            modules.insert(module, path.as_str());
            if let Some(parsed) = &record.parsed {
                files.insert(path.as_str(), parsed);
            }
        }
        let mut resolver = Self {
            files,
            modules,
            scopes: HashMap::new(),
        };
        let scopes = resolver
            .files
            .values()
            .map(|&file| (file.file_path.as_str(), resolver.file_scope(file)))
            .collect();
        resolver.scopes = scopes;
        resolver
    }

    /// File path of a module, if the module is part of the snapshot.
    pub fn module_file(&self, module: &str) -> Option<&'a str> {
        self.modules.get(module).copied()
    }

    fn file_scope(&self, file: &ParsedFile) -> FileScope {
        let mut scope = FileScope::default();
        for import in &file.imports {
            let Some(base) = absolute_module(file, import) else {
                continue;
            };
            scope.imported_modules.push((base.clone(), import.line));
            if !import.is_from {
                match &import.alias {
                    Some(alias) => {
                        scope.bindings.insert(alias.clone(), Binding::Module(base));
                    }
                    None => {
                        // `import a.b.c` binds `a`
                        let root = base.split('.').next().unwrap_or(&base).to_string();
                        scope
                            .bindings
                            .entry(root.clone())
                            .or_insert(Binding::Module(root));
                    }
                }
                continue;
            }
            if import.is_star {
                scope.star_modules.push(base.clone());
            }
            for name in &import.names {
                let submodule = format!("{base}.{}", name.name);
                let binding = if self.modules.contains_key(&submodule) {
                    scope.imported_modules.push((submodule.clone(), import.line));
                    Binding::Module(submodule)
                } else {
                    Binding::Symbol {
                        module: base.clone(),
                        name: name.name.clone(),
                    }
                };
                scope.bindings.insert(name.local().to_string(), binding);
            }
        }
        scope
    }

    /// Resolve every import, base class and call site of one file.
    pub fn resolve_file(&self, file_path: &str, generation: u64) -> ResolvedFile {
        let mut out = ResolvedFile::default();
        let Some(&file) = self.files.get(file_path) else {
            return out;
        };
        let Some(scope) = self.scopes.get(file_path) else {
            return out;
        };

        let source_file = file_node_id(file_path);
        let mut seen = HashSet::new();
        for (module, line) in &scope.imported_modules {
            let Some(target) = self.module_file(module) else {
                continue;
            };
            if target != file_path && seen.insert(target) {
                out.edges.push(GraphEdge::structural(
                    source_file,
                    file_node_id(target),
                    EdgeKind::Imports,
                    file_path,
                    *line,
                    generation,
                ));
            }
        }

        for class in file
            .definitions
            .iter()
            .filter(|d| d.kind == DefinitionKind::Class)
        {
            let source = def_node_id(file_path, class);
            for base in &class.bases {
                match self.resolve_dotted(file, base, 0) {
                    Some((found, _)) if found.def.kind == DefinitionKind::Class => {
                        out.edges.push(GraphEdge::structural(
                            source,
                            found.node_id(),
                            EdgeKind::Inherits,
                            file_path,
                            class.line_start,
                            generation,
                        ));
                    }
                    _ => out.unresolved.push(UnresolvedRef {
                        file_path: file_path.to_string(),
                        line: class.line_start,
                        from: class.qualified_name.clone(),
                        name: base.clone(),
                    }),
                }
            }
        }

        for reference in &file.references {
            let caller = reference
                .scope
                .as_deref()
                .and_then(|qualname| file.definition(qualname));
            let Some(caller) = caller else {
                out.dropped_calls += 1;
                continue;
            };
            let Some((target, confidence)) = self.resolve_call(file, caller, &reference.callee)
            else {
                out.dropped_calls += 1;
                continue;
            };
            let source = def_node_id(file_path, caller);
            let target_id = target.node_id();
            if source == target_id {
                continue;
            }
            out.edges.push(GraphEdge {
                source,
                target: target_id,
                kind: EdgeKind::Calls,
                confidence,
                strategy: None,
                file_path: file_path.to_string(),
                line: reference.line,
                generation,
            });
        }
        out
    }

    /// Resolve a callee expression as seen from `caller`.
    pub fn resolve_call(
        &self,
        file: &'a ParsedFile,
        caller: &'a Definition,
        callee: &str,
    ) -> Option<(Found<'a>, f64)> {
        let (head, rest) = match callee.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (callee, None),
        };
        if matches!(head, "self" | "cls") {
            let method = rest?;
            if method.contains('.') {
                return None;
            }
            let class = enclosing_class(file, caller)?;
            return self
                .find_method(file, class, method, 0)
                .map(|found| (found, SELF_METHOD));
        }
        self.resolve_dotted(file, callee, 0)
    }

    /// Resolve a dotted expression written at module level of `file`.
    fn resolve_dotted(&self, file: &'a ParsedFile, text: &str, depth: u32) -> Option<(Found<'a>, f64)> {
        let mut parts = text.split('.');
        let head = parts.next()?;
        let rest: Vec<&str> = parts.collect();
        let (start, confidence) = self.resolve_head(file, head)?;
        let found = match start {
            Head::Def(found) => self.descend(found, &rest, depth)?,
            Head::Module(module) => self.resolve_in_module(&module, &rest, depth)?,
        };
        Some((found, confidence))
    }

    fn resolve_head(&self, file: &'a ParsedFile, name: &str) -> Option<(Head<'a>, f64)> {
        if let Some(def) = file.definition(name) {
            return Some((Head::Def(Found { file, def }), SAME_MODULE));
        }
        let scope = self.scopes.get(file.file_path.as_str())?;
        if let Some(binding) = scope.bindings.get(name) {
            return match binding {
                Binding::Module(module) => Some((Head::Module(module.clone()), EXPLICIT_IMPORT)),
                Binding::Symbol { module, name } => self
                    .lookup_in_module(module, name, 0)
                    .map(|found| (Head::Def(found), EXPLICIT_IMPORT)),
            };
        }
        scope.star_modules.iter().find_map(|module| {
            self.lookup_in_module(module, name, 0)
                .map(|found| (Head::Def(found), STAR_IMPORT))
        })
    }

    /// Walk `rest` through submodules, then look up the remaining attribute path.
    fn resolve_in_module(&self, module: &str, rest: &[&str], depth: u32) -> Option<Found<'a>> {
        let mut module = module.to_string();
        let mut idx = 0;
        while idx < rest.len() {
            let submodule = format!("{module}.{}", rest[idx]);
            if !self.modules.contains_key(&submodule) {
                break;
            }
            module = submodule;
            idx += 1;
        }
        let name = rest.get(idx)?;
        let found = self.lookup_in_module(&module, name, 0)?;
        self.descend(found, &rest[idx + 1..], depth)
    }

    /// A top-level name of a module, following re-exports.
    fn lookup_in_module(&self, module: &str, name: &str, depth: u32) -> Option<Found<'a>> {
        let path = self.module_file(module)?;
        let file = *self.files.get(path)?;
        if let Some(def) = file.definition(name) {
            return Some(Found { file, def });
        }
        if depth >= MAX_DEPTH {
            return None;
        }
        match self.scopes.get(path)?.bindings.get(name)? {
            Binding::Symbol { module, name } => self.lookup_in_module(module, name, depth + 1),
            Binding::Module(_) => None,
        }
    }

    /// Attribute access on a found definition (`Class.method`, `Outer.Inner`).
    fn descend(&self, found: Found<'a>, tail: &[&str], depth: u32) -> Option<Found<'a>> {
        if tail.is_empty() {
            return Some(found);
        }
        if found.def.kind != DefinitionKind::Class {
            return None;
        }
        let qualname = format!("{}.{}", found.def.qualified_name, tail.join("."));
        if let Some(def) = found.file.definition(&qualname) {
            return Some(Found {
                file: found.file,
                def,
            });
        }
        match tail {
            [method] => self.find_method(found.file, found.def, method, depth),
            _ => None,
        }
    }

    /// A method on a class or, failing that, on its resolvable bases.
    fn find_method(
        &self,
        file: &'a ParsedFile,
        class: &'a Definition,
        method: &str,
        depth: u32,
    ) -> Option<Found<'a>> {
        let qualname = format!("{}.{}", class.qualified_name, method);
        if let Some(def) = file.definition(&qualname) {
            return Some(Found { file, def });
        }
        if depth >= MAX_DEPTH {
            return None;
        }
        class.bases.iter().find_map(|base| {
            let (base, _) = self.resolve_dotted(file, base, depth + 1)?;
            if base.def.kind != DefinitionKind::Class {
                return None;
            }
            self.find_method(base.file, base.def, method, depth + 1)
        })
    }
}

/// Class whose `self`/`cls` a definition sees.
fn enclosing_class<'a>(file: &'a ParsedFile, def: &'a Definition) -> Option<&'a Definition> {
    if def.kind == DefinitionKind::Class {
        return Some(def);
    }
    let parent = file.definition(def.parent.as_deref()?)?;
    (parent.kind == DefinitionKind::Class).then_some(parent)
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
