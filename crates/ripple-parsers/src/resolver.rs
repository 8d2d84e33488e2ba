use serde::{Deserialize, Serialize};

use ripple_core::types::Param;

/// The abstraction every language-specific parser implements.
///
/// A resolver turns the bytes of one file into its declared definitions,
/// imports and raw call references. It is pure and stateless per file, and
/// must be `Send + Sync` so one instance can be shared across the rayon
/// parse pool.
pub trait LanguageResolver: Send + Sync {
    /// Canonical language name (e.g. "python").
    fn language(&self) -> &str;

    /// Whether this resolver handles the given repo-relative path.
    fn handles(&self, file_path: &str) -> bool;

    /// Dotted module name for a repo-relative path.
    fn module_name(&self, file_path: &str) -> String;

    /// Parse one file. A failure is confined to this file.
    fn parse_file(&self, file_path: &str, content: &[u8]) -> Result<ParsedFile, ParseFailure>;
}

/// Complete parse output for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_path: String,
    pub module: String,
    /// File is a package initializer (`__init__.py`).
    pub is_package: bool,
    pub content_hash: String,
    pub is_test_file: bool,
    pub line_count: u32,
    pub definitions: Vec<Definition>,
    pub imports: Vec<Import>,
    pub references: Vec<Reference>,
}

impl ParsedFile {
    pub fn definition(&self, qualified_name: &str) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|d| d.qualified_name == qualified_name)
    }

    pub fn tests(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| d.is_test)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Function,
    Class,
}

/// A function, method or class declared in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// Dotted path within the module (`Outer.Inner.method`).
    pub qualified_name: String,
    pub kind: DefinitionKind,
    /// Qualified name of the enclosing class, for methods and nested classes.
    pub parent: Option<String>,
    pub line_start: u32,
    pub line_end: u32,
    #[serde(default)]
    pub params: Vec<Param>,
    pub doc_summary: Option<String>,
    /// Base class expressions as written (`Base`, `mod.Base`).
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    pub is_test: bool,
}

impl Definition {
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// One imported name in a `from x import a as b` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// Name bound in the importing module.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An import statement.
///
/// `import a.b as c` has `module = "a.b"`, `alias = Some("c")`, no names.
/// `from ..pkg import x` has `level = 2`, `module = "pkg"`, `names = [x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    pub level: u32,
    pub alias: Option<String>,
    #[serde(default)]
    pub names: Vec<ImportedName>,
    pub is_from: bool,
    pub is_star: bool,
    pub line: u32,
}

/// A call site, unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Qualified name of the enclosing definition; `None` at module level.
    pub scope: Option<String>,
    /// Dotted callee text (`helper`, `self.save`, `mod.func`).
    pub callee: String,
    pub line: u32,
}

/// A single file could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ParseFailure {
    #[error("{file_path}: syntax error at line {line}")]
    Syntax { file_path: String, line: u32 },
    #[error("{file_path}: not valid UTF-8")]
    Encoding { file_path: String },
    #[error("{file_path}: {message}")]
    Io { file_path: String, message: String },
    #[error("{file_path}: parser error: {message}")]
    Parser { file_path: String, message: String },
}

impl ParseFailure {
    pub fn file_path(&self) -> &str {
        match self {
            ParseFailure::Syntax { file_path, .. }
            | ParseFailure::Encoding { file_path }
            | ParseFailure::Io { file_path, .. }
            | ParseFailure::Parser { file_path, .. } => file_path,
        }
    }
}
