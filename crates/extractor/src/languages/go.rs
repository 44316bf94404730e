use crate::language::Language;
use crate::parser::{
    field_text, leading_comments, normalize_module_path, span_text, Definition, RawReference,
    SourceParser, Visit,
};
use crate::types::{EdgeKind, SymbolKind};
use tree_sitter::Node;

/// Go parser.
///
/// Methods are qualified by their receiver type (`Server.Start`) and are
/// contained by that type when it is declared in the same file. Struct and
/// interface types are classes; embedded types become inheritance.
pub struct GoParser;

impl SourceParser for GoParser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn classify<'t>(&self, node: Node<'t>, src: &str) -> Visit<'t> {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = field_text(src, node, "name") else {
                    return Visit::Descend;
                };
                Visit::Definition(
                    Definition::new(SymbolKind::Function, name, node)
                        .with_body(node.child_by_field_name("body")),
                )
            }
            "method_declaration" => {
                let Some(name) = field_text(src, node, "name") else {
                    return Visit::Descend;
                };
                Visit::Definition(
                    Definition::new(SymbolKind::Function, name, node)
                        .with_body(node.child_by_field_name("body"))
                        .with_receiver(receiver_type(node, src)),
                )
            }
            "method_elem" | "method_spec" => match field_text(src, node, "name") {
                Some(name) => Visit::Definition(Definition::new(SymbolKind::Function, name, node)),
                None => Visit::Descend,
            },
            "type_spec" => {
                let (Some(name), Some(ty)) =
                    (field_text(src, node, "name"), node.child_by_field_name("type"))
                else {
                    return Visit::Descend;
                };
                if !matches!(ty.kind(), "struct_type" | "interface_type") {
                    return Visit::Descend;
                }
                // A lone spec owns its `type` keyword and doc comment
                let span = match node.parent() {
                    Some(decl)
                        if decl.kind() == "type_declaration" && decl.named_child_count() == 1 =>
                    {
                        decl
                    }
                    _ => node,
                };
                Visit::Definition(
                    Definition::new(SymbolKind::Class, name, span).with_body(open_brace(ty)),
                )
            }
            _ => Visit::Descend,
        }
    }

    fn references(&self, node: Node<'_>, src: &str, out: &mut Vec<RawReference>) {
        match node.kind() {
            "import_spec" => {
                let Some(raw) = field_text(src, node, "path") else {
                    return;
                };
                let raw = raw.trim_matches(|c| c == '"' || c == '`');
                let (name, qualifier) = match raw.rsplit_once('/') {
                    Some((parent, last)) => (last, Some(normalize_module_path(parent))),
                    None => (raw, None),
                };
                out.push(RawReference::new(name, qualifier, EdgeKind::Imports, node));
            }
            "call_expression" => {
                if let Some((name, qualifier)) = node
                    .child_by_field_name("function")
                    .and_then(|f| callee(f, src))
                {
                    out.push(RawReference::new(name, qualifier, EdgeKind::Calls, node));
                }
            }
            // Embedded struct field: a type with no field name
            "field_declaration" if node.child_by_field_name("name").is_none() => {
                if let Some((name, qualifier)) = node
                    .child_by_field_name("type")
                    .and_then(|t| type_path(t, src))
                {
                    out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, node));
                }
            }
            // Embedded interface
            "type_elem" => {
                let mut cursor = node.walk();
                for ty in node.named_children(&mut cursor) {
                    if let Some((name, qualifier)) = type_path(ty, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, ty));
                    }
                }
            }
            _ => {}
        }
    }

    fn docstring(&self, definition: &Definition<'_>, src: &str) -> Option<String> {
        doc_comment(src, definition.span.start_position().row)
    }

    fn module_docstring(&self, root: Node<'_>, src: &str) -> Option<String> {
        let mut cursor = root.walk();
        let package = root
            .named_children(&mut cursor)
            .find(|child| child.kind() == "package_clause")?;
        doc_comment(src, package.start_position().row)
    }
}

/// `//` comment block above `row`; `//go:` directives are skipped
fn doc_comment(src: &str, row: usize) -> Option<String> {
    leading_comments(
        src,
        row,
        |line| line.starts_with("//") && !line.starts_with("//go:"),
        |line| line.starts_with("//go:"),
        |line| line.trim_start_matches("//"),
    )
}

/// Type name of a method receiver: `(s *Server)`, `(Server)`, `(l *List[T])`
fn receiver_type(node: Node<'_>, src: &str) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    let param = receiver
        .named_children(&mut cursor)
        .find(|child| child.kind() == "parameter_declaration")?;
    let ty = param.child_by_field_name("type")?;
    type_path(ty, src).map(|(name, _)| name)
}

/// Split a type reference into (name, package qualifier)
fn type_path(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "type_identifier" | "identifier" => Some((span_text(src, node).to_string(), None)),
        "qualified_type" => {
            let name = field_text(src, node, "name")?;
            let package = field_text(src, node, "package").map(str::to_string);
            Some((name.to_string(), package))
        }
        "generic_type" => node.child_by_field_name("type").and_then(|t| type_path(t, src)),
        "pointer_type" | "parenthesized_type" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next()?;
            type_path(inner, src)
        }
        _ => None,
    }
}

fn callee(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" => Some((span_text(src, node).to_string(), None)),
        // `pkg.Func()` or `value.Method()`; only a bare operand can name a package
        "selector_expression" => {
            let name = field_text(src, node, "field")?;
            let qualifier = node
                .child_by_field_name("operand")
                .filter(|operand| operand.kind() == "identifier")
                .map(|operand| span_text(src, operand).to_string());
            Some((name.to_string(), qualifier))
        }
        // `Map[int](xs)`
        "index_expression" => node
            .child_by_field_name("operand")
            .and_then(|f| callee(f, src)),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next()?;
            callee(inner, src)
        }
        _ => None,
    }
}

/// The `{` opening a struct or interface body
fn open_brace(ty: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = ty.walk();
    for child in ty.children(&mut cursor) {
        if child.kind() == "{" {
            return Some(child);
        }
        if child.kind() == "field_declaration_list" {
            let mut inner = child.walk();
            let brace = child.children(&mut inner).find(|c| c.kind() == "{");
            return brace;
        }
    }
    None
}
