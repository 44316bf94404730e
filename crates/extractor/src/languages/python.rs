use crate::language::Language;
use crate::parser::{
    field_text, leading_comments, normalize_module_path, span_text, split_module, Definition,
    RawReference, SourceParser, Visit,
};
use crate::types::{EdgeKind, SymbolKind};
use tree_sitter::Node;

pub struct PythonParser;

impl SourceParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn classify<'t>(&self, node: Node<'t>, src: &str) -> Visit<'t> {
        let kind = match node.kind() {
            "function_definition" => SymbolKind::Function,
            "class_definition" => SymbolKind::Class,
            _ => return Visit::Descend,
        };
        let Some(name) = field_text(src, node, "name") else {
            return Visit::Descend;
        };
        Visit::Definition(
            Definition::new(kind, name, node).with_body(node.child_by_field_name("body")),
        )
    }

    fn references(&self, node: Node<'_>, src: &str, out: &mut Vec<RawReference>) {
        match node.kind() {
            "call" => {
                if let Some(function) = node.child_by_field_name("function") {
                    if let Some((name, qualifier)) = callee(function, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Calls, node));
                    }
                }
            }
            "class_definition" => {
                let Some(bases) = node.child_by_field_name("superclasses") else {
                    return;
                };
                let mut cursor = bases.walk();
                for base in bases.named_children(&mut cursor) {
                    if let Some((name, qualifier)) = callee(base, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, base));
                    }
                }
            }
            "import_statement" => {
                let mut cursor = node.walk();
                for imported in node.children_by_field_name("name", &mut cursor) {
                    let module = imported_name(imported, src);
                    if let Some((name, parent)) = split_module(&normalize_module_path(module)) {
                        out.push(RawReference::new(name, parent, EdgeKind::Imports, node));
                    }
                }
            }
            "import_from_statement" => {
                let module = field_text(src, node, "module_name")
                    .map(normalize_module_path)
                    .filter(|m| !m.is_empty());
                let mut cursor = node.walk();
                for imported in node.children_by_field_name("name", &mut cursor) {
                    let name = imported_name(imported, src);
                    if name.is_empty() {
                        continue;
                    }
                    out.push(RawReference::new(name, module.clone(), EdgeKind::Imports, node));
                }
            }
            _ => {}
        }
    }

    fn docstring(&self, definition: &Definition<'_>, src: &str) -> Option<String> {
        let body = definition.body?;
        first_string_statement(body, src).or_else(|| {
            leading_comments(
                src,
                definition.span.start_position().row,
                |line| line.starts_with('#'),
                |line| line.starts_with('@'),
                |line| line.trim_start_matches('#'),
            )
        })
    }

    fn module_docstring(&self, root: Node<'_>, src: &str) -> Option<String> {
        first_string_statement(root, src)
    }
}

/// `foo` or `obj.method` -> (name, receiver)
fn callee(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" => Some((span_text(src, node).to_string(), None)),
        "attribute" => {
            let name = field_text(src, node, "attribute")?;
            let receiver = node
                .child_by_field_name("object")
                .filter(|obj| matches!(obj.kind(), "identifier" | "attribute"))
                .map(|obj| span_text(src, obj).to_string());
            Some((name.to_string(), receiver))
        }
        _ => None,
    }
}

/// Original name of an imported item, ignoring `as` aliases
fn imported_name<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    if node.kind() == "aliased_import" {
        return field_text(src, node, "name").unwrap_or("");
    }
    span_text(src, node)
}

fn first_string_statement(block: Node<'_>, src: &str) -> Option<String> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    Some(clean_string_literal(span_text(src, string)))
}

fn clean_string_literal(raw: &str) -> String {
    let unprefixed = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let inner = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|quote| {
            unprefixed
                .strip_prefix(quote)
                .and_then(|s| s.strip_suffix(quote))
        })
        .unwrap_or(unprefixed);
    inner
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
