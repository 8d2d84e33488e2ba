use std::path::Path;

use tree_sitter::Node;

use ripple_core::types::Param;

use crate::treesitter::node_text;

/// `pkg/sub/mod.py` -> `pkg.sub.mod`; `pkg/__init__.py` -> `pkg`.
pub fn module_name_from_rel_path(rel_path: &str) -> String {
    let path = Path::new(rel_path);
    let mut parts: Vec<String> = path
        .components()
        .filter_map(|comp| comp.as_os_str().to_str().map(|s| s.to_string()))
        .collect();
    if parts.is_empty() {
        return "__init__".to_string();
    }
    let file = parts.pop().unwrap_or_default();
    let stem = Path::new(&file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file)
        .to_string();
    if stem != "__init__" {
        parts.push(stem);
    }
    if parts.is_empty() {
        "__init__".to_string()
    } else {
        parts.join(".")
    }
}

/// Identifier chain such as `a`, `self.save`, `pkg.mod.func`.
pub fn is_dotted_name(raw: &str) -> bool {
    !raw.is_empty()
        && raw.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
                && chars.all(|c| c == '_' || c.is_alphanumeric())
        })
}

/// Docstring of a block: its first statement, if that is a bare string.
pub fn extract_docstring(body: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let raw = node_text(string_node, source);
    unquote_string_literal(raw)
}

/// First non-empty line of a docstring.
pub fn doc_summary(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn unquote_string_literal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let prefix_len = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)?;
    let rest = &trimmed[prefix_len..];
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if rest.len() >= 2 * quote.len() && rest.starts_with(quote) && rest.ends_with(quote) {
            return Some(rest[quote.len()..rest.len() - quote.len()].to_string());
        }
    }
    None
}

/// Ordered parameters of a `parameters` node.
pub fn extract_params(params: Node<'_>, source: &str) -> Vec<Param> {
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => Param {
                name: node_text(child, source).to_string(),
                default: None,
            },
            "typed_parameter" => {
                let Some(name) = child.named_child(0) else {
                    continue;
                };
                Param {
                    name: node_text(name, source).to_string(),
                    default: None,
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                Param {
                    name: node_text(name, source).to_string(),
                    default: child
                        .child_by_field_name("value")
                        .map(|v| node_text(v, source).to_string()),
                }
            }
            _ => continue,
        };
        out.push(param);
    }
    out
}
