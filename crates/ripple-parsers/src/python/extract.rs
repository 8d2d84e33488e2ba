//! Recursive walk over a Python syntax tree.
//!
//! Functions nested inside other functions are not separate definitions:
//! their calls are attributed to the outermost enclosing function, which is
//! the unit the graph tracks.

use tree_sitter::Node;

use crate::resolver::{Definition, DefinitionKind, Import, ImportedName, Reference};
use crate::test_detection::{is_test_class_name, is_test_function_name};
use crate::treesitter::{end_line, node_text, start_line};

use super::helpers::{doc_summary, extract_docstring, extract_params, is_dotted_name};

#[derive(Debug, Default)]
pub(super) struct Extracted {
    pub definitions: Vec<Definition>,
    pub imports: Vec<Import>,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default)]
struct Context {
    class_stack: Vec<String>,
    /// Definition that calls are attributed to.
    scope: Option<String>,
    fn_depth: usize,
}

impl Context {
    fn qualname(&self, name: &str) -> String {
        if self.class_stack.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.class_stack.join("."), name)
        }
    }

    fn parent(&self) -> Option<String> {
        (!self.class_stack.is_empty()).then(|| self.class_stack.join("."))
    }

    fn in_test_class(&self) -> bool {
        self.class_stack
            .last()
            .is_some_and(|c| is_test_class_name(c))
    }
}

struct Walker<'a> {
    source: &'a str,
    is_test_file: bool,
    out: Extracted,
}

pub(super) fn extract(root: Node<'_>, source: &str, is_test_file: bool) -> Extracted {
    let mut walker = Walker {
        source,
        is_test_file,
        out: Extracted::default(),
    };
    walker.walk_node(root, &Context::default());
    walker.out
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.source)
    }

    fn walk_node(&mut self, node: Node<'_>, ctx: &Context) {
        match node.kind() {
            "decorated_definition" => {
                self.handle_decorated(node, ctx);
                return;
            }
            "class_definition" if ctx.fn_depth == 0 => {
                self.handle_class(node, node, ctx, vec![]);
                return;
            }
            "function_definition" | "async_function_definition" if ctx.fn_depth == 0 => {
                self.handle_function(node, node, ctx, vec![]);
                return;
            }
            "import_statement" => {
                self.handle_import(node);
                return;
            }
            "import_from_statement" => {
                self.handle_from_import(node);
                return;
            }
            "call" => self.handle_call(node, ctx),
            _ => {}
        }
        self.walk_children(node, ctx);
    }

    fn walk_children(&mut self, node: Node<'_>, ctx: &Context) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.walk_node(child, ctx);
        }
    }

    fn handle_decorated(&mut self, node: Node<'_>, ctx: &Context) {
        let mut decorators = Vec::new();
        let mut definition = None;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "decorator" => {
                    let text = self.text(child).trim_start_matches('@').trim();
                    decorators.push(text.to_string());
                }
                "function_definition" | "async_function_definition" | "class_definition" => {
                    definition = Some(child);
                }
                _ => {}
            }
        }
        let Some(definition) = definition else {
            return;
        };
        if ctx.fn_depth > 0 {
            self.walk_children(definition, ctx);
            return;
        }
        if definition.kind() == "class_definition" {
            self.handle_class(definition, node, ctx, decorators);
        } else {
            self.handle_function(definition, node, ctx, decorators);
        }
    }

    fn handle_class(&mut self, node: Node<'_>, span: Node<'_>, ctx: &Context, decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();
        let qualified_name = ctx.qualname(&name);
        let body = node.child_by_field_name("body");

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for child in superclasses.named_children(&mut cursor) {
                let base = self.text(child);
                if is_dotted_name(base) {
                    bases.push(base.to_string());
                }
            }
        }

        self.out.definitions.push(Definition {
            name: name.clone(),
            qualified_name: qualified_name.clone(),
            kind: DefinitionKind::Class,
            parent: ctx.parent(),
            line_start: start_line(span),
            line_end: end_line(span),
            params: vec![],
            doc_summary: body
                .and_then(|b| extract_docstring(b, self.source))
                .and_then(|d| doc_summary(&d)),
            bases,
            decorators,
            is_test: false,
        });

        let mut next = ctx.clone();
        next.class_stack.push(name);
        next.scope = Some(qualified_name);
        if let Some(body) = body {
            self.walk_children(body, &next);
        }
    }

    fn handle_function(
        &mut self,
        node: Node<'_>,
        span: Node<'_>,
        ctx: &Context,
        decorators: Vec<String>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name_node).to_string();
        let qualified_name = ctx.qualname(&name);
        let body = node.child_by_field_name("body");
        let is_test = self.is_test_file
            && is_test_function_name(&name)
            && (ctx.class_stack.is_empty() || ctx.in_test_class());

        self.out.definitions.push(Definition {
            name,
            qualified_name: qualified_name.clone(),
            kind: DefinitionKind::Function,
            parent: ctx.parent(),
            line_start: start_line(span),
            line_end: end_line(span),
            params: node
                .child_by_field_name("parameters")
                .map(|p| extract_params(p, self.source))
                .unwrap_or_default(),
            doc_summary: body
                .and_then(|b| extract_docstring(b, self.source))
                .and_then(|d| doc_summary(&d)),
            bases: vec![],
            decorators,
            is_test,
        });

        let mut next = ctx.clone();
        next.fn_depth += 1;
        next.scope = Some(qualified_name);
        if let Some(body) = body {
            self.walk_children(body, &next);
        }
    }

    fn handle_call(&mut self, node: Node<'_>, ctx: &Context) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = self.text(function);
        if !is_dotted_name(callee) {
            return;
        }
        self.out.references.push(Reference {
            scope: ctx.scope.clone(),
            callee: callee.to_string(),
            line: start_line(node),
        });
    }

    /// `import a.b`, `import a.b as c`, `import a, b`.
    fn handle_import(&mut self, node: Node<'_>) {
        let line = start_line(node);
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            let (module, alias) = match child.kind() {
                "dotted_name" => (self.text(child).to_string(), None),
                "aliased_import" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|a| self.text(a).to_string());
                    (self.text(name).to_string(), alias)
                }
                _ => continue,
            };
            self.out.imports.push(Import {
                module,
                level: 0,
                alias,
                names: vec![],
                is_from: false,
                is_star: false,
                line,
            });
        }
    }

    /// `from m import a as b, c`, `from ..m import *`, `from . import x`.
    fn handle_from_import(&mut self, node: Node<'_>) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let (module, level) = match module_node.kind() {
            "relative_import" => {
                let mut level = 0;
                let mut module = String::new();
                let mut cursor = module_node.walk();
                for child in module_node.children(&mut cursor) {
                    match child.kind() {
                        "import_prefix" => {
                            level = self.text(child).chars().filter(|c| *c == '.').count() as u32
                        }
                        "dotted_name" => module = self.text(child).to_string(),
                        _ => {}
                    }
                }
                (module, level)
            }
            _ => (self.text(module_node).to_string(), 0),
        };

        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            match child.kind() {
                "dotted_name" => names.push(ImportedName {
                    name: self.text(child).to_string(),
                    alias: None,
                }),
                "aliased_import" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(ImportedName {
                            name: self.text(name).to_string(),
                            alias: child
                                .child_by_field_name("alias")
                                .map(|a| self.text(a).to_string()),
                        });
                    }
                }
                _ => {}
            }
        }
        let mut cursor = node.walk();
        let is_star = node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");

        self.out.imports.push(Import {
            module,
            level,
            alias: None,
            names,
            is_from: true,
            is_star,
            line: start_line(node),
        });
    }
}
