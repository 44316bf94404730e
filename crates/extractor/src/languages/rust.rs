use crate::language::Language;
use crate::parser::{
    field_text, leading_comments, normalize_module_path, span_text, Definition, RawReference,
    SourceParser, Visit,
};
use crate::types::{EdgeKind, SymbolKind};
use tree_sitter::Node;

pub struct RustParser;

impl SourceParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn classify<'t>(&self, node: Node<'t>, src: &str) -> Visit<'t> {
        let kind = match node.kind() {
            "function_item" | "function_signature_item" => SymbolKind::Function,
            "struct_item" | "enum_item" | "union_item" | "trait_item" => SymbolKind::Class,
            "impl_item" => {
                return match node.child_by_field_name("type").and_then(|ty| type_name(ty, src)) {
                    Some(name) => Visit::Scope {
                        name,
                        owner: Some(SymbolKind::Class),
                    },
                    None => Visit::Descend,
                };
            }
            "mod_item" => {
                return match field_text(src, node, "name") {
                    Some(name) => Visit::Scope {
                        name: name.to_string(),
                        owner: None,
                    },
                    None => Visit::Descend,
                };
            }
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
            "call_expression" => {
                if let Some((name, qualifier)) = node
                    .child_by_field_name("function")
                    .and_then(|f| callee(f, src))
                {
                    out.push(RawReference::new(name, qualifier, EdgeKind::Calls, node));
                }
            }
            "use_declaration" => {
                if let Some(argument) = node.child_by_field_name("argument") {
                    collect_use(argument, src, "", node, out);
                }
            }
            "impl_item" => {
                if let Some((name, qualifier)) = node
                    .child_by_field_name("trait")
                    .and_then(|t| type_path(t, src))
                {
                    out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, node));
                }
            }
            "trait_item" => {
                let Some(bounds) = node.child_by_field_name("bounds") else {
                    return;
                };
                let mut cursor = bounds.walk();
                for bound in bounds.named_children(&mut cursor) {
                    if let Some((name, qualifier)) = type_path(bound, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, bound));
                    }
                }
            }
            _ => {}
        }
    }

    fn docstring(&self, definition: &Definition<'_>, src: &str) -> Option<String> {
        leading_comments(
            src,
            definition.span.start_position().row,
            |line| line.starts_with("///") && !line.starts_with("////"),
            |line| line.starts_with("#["),
            |line| line.trim_start_matches("///"),
        )
    }

    fn module_docstring(&self, root: Node<'_>, src: &str) -> Option<String> {
        let text = span_text(src, root)
            .lines()
            .map(str::trim)
            .take_while(|line| line.starts_with("//!") || line.is_empty())
            .filter_map(|line| line.strip_prefix("//!"))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Simple name of an impl target (`Foo`, `Foo<T>`, `crate::a::Foo`)
fn type_name(node: Node<'_>, src: &str) -> Option<String> {
    type_path(node, src).map(|(name, _)| name)
}

/// Split a type reference into (name, module qualifier)
fn type_path(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "type_identifier" | "identifier" => Some((span_text(src, node).to_string(), None)),
        "generic_type" => node.child_by_field_name("type").and_then(|t| type_path(t, src)),
        "scoped_type_identifier" | "scoped_identifier" => {
            let name = field_text(src, node, "name")?;
            let qualifier = field_text(src, node, "path").map(normalize_module_path);
            Some((name.to_string(), qualifier))
        }
        _ => None,
    }
}

fn callee(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" => Some((span_text(src, node).to_string(), None)),
        "field_expression" => field_text(src, node, "field").map(|f| (f.to_string(), None)),
        "scoped_identifier" => {
            let name = field_text(src, node, "name")?;
            let qualifier = field_text(src, node, "path").map(normalize_module_path);
            Some((name.to_string(), qualifier))
        }
        "generic_function" => node
            .child_by_field_name("function")
            .and_then(|f| callee(f, src)),
        _ => None,
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    match (prefix.is_empty(), segment.is_empty()) {
        (true, _) => segment.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}::{segment}"),
    }
}

/// Expand a `use` tree into one import reference per leaf
fn collect_use(
    node: Node<'_>,
    src: &str,
    prefix: &str,
    anchor: Node<'_>,
    out: &mut Vec<RawReference>,
) {
    match node.kind() {
        "identifier" | "type_identifier" => {
            let qualifier = normalize_module_path(prefix);
            out.push(RawReference::new(
                span_text(src, node),
                Some(qualifier),
                EdgeKind::Imports,
                anchor,
            ));
        }
        "self" => {
            // `use a::b::{self}` imports module `b`
            let dotted = normalize_module_path(prefix);
            if let Some((name, parent)) = crate::parser::split_module(&dotted) {
                out.push(RawReference::new(name, parent, EdgeKind::Imports, anchor));
            }
        }
        "scoped_identifier" => {
            let path = field_text(src, node, "path").unwrap_or("");
            if let Some(name) = node.child_by_field_name("name") {
                collect_use(name, src, &join_path(prefix, path), anchor, out);
            }
        }
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                collect_use(path, src, prefix, anchor, out);
            }
        }
        "scoped_use_list" => {
            let path = field_text(src, node, "path").unwrap_or("");
            if let Some(list) = node.child_by_field_name("list") {
                collect_use(list, src, &join_path(prefix, path), anchor, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_use(child, src, prefix, anchor, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SRC: &str = r#"//! Vehicle models.
use crate::engine::{self, Engine};
use std::fmt::Display as Show;

/// A car.
#[derive(Debug)]
pub struct Car {
    engine: Engine,
}

pub trait Drive: Show {
    fn drive(&self);
}

impl Drive for Car {
    fn drive(&self) {
        engine::start(&self.engine);
        self.honk();
    }
}

impl Car {
    /// Make noise.
    pub fn honk(&self) {
        log_event("honk");
    }
}

mod tests {
    fn helper() {}
}
"#;

    #[test]
    fn qualifies_impl_methods_by_type() {
        let extraction = RustParser.extract("src/car.rs", SRC);
        let ids: Vec<&str> = extraction.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "file:src/car.rs",
                "class:src/car.rs:Car",
                "class:src/car.rs:Drive",
                "function:src/car.rs:Drive.drive",
                "function:src/car.rs:Car.drive",
                "function:src/car.rs:Car.honk",
                "function:src/car.rs:tests.helper",
            ]
        );
        assert_eq!(
            extraction.symbols[0].docstring.as_deref(),
            Some("Vehicle models.")
        );
        assert_eq!(extraction.symbols[1].docstring.as_deref(), Some("A car."));
        assert_eq!(extraction.symbols[5].docstring.as_deref(), Some("Make noise."));
        assert_eq!(
            extraction.symbols[5].signature.as_deref(),
            Some("pub fn honk(&self)")
        );
    }

    #[test]
    fn impl_methods_are_contained_by_their_type() {
        let extraction = RustParser.extract("src/car.rs", SRC);
        assert!(extraction.contains.iter().any(|e| e.from == "class:src/car.rs:Car"
            && e.to == "function:src/car.rs:Car.honk"));
        assert!(extraction.contains.iter().any(|e| e.from == "file:src/car.rs"
            && e.to == "function:src/car.rs:tests.helper"));
    }

    #[test]
    fn collects_use_trait_and_call_references() {
        let extraction = RustParser.extract("src/car.rs", SRC);
        let refs: Vec<(&str, &str, Option<&str>, EdgeKind)> = extraction
            .references
            .iter()
            .map(|r| (r.from.as_str(), r.name.as_str(), r.qualifier.as_deref(), r.kind))
            .collect();

        assert!(refs.contains(&("file:src/car.rs", "engine", None, EdgeKind::Imports)));
        assert!(refs.contains(&("file:src/car.rs", "Engine", Some("engine"), EdgeKind::Imports)));
        assert!(refs.contains(&("file:src/car.rs", "Display", Some("std.fmt"), EdgeKind::Imports)));
        assert!(refs.contains(&("class:src/car.rs:Car", "Drive", None, EdgeKind::Inherits)));
        assert!(refs.contains(&("class:src/car.rs:Drive", "Show", None, EdgeKind::Inherits)));
        assert!(refs.contains(&(
            "function:src/car.rs:Car.drive",
            "start",
            Some("engine"),
            EdgeKind::Calls
        )));
        assert!(refs.contains(&("function:src/car.rs:Car.drive", "honk", None, EdgeKind::Calls)));
        assert!(refs.contains(&(
            "function:src/car.rs:Car.honk",
            "log_event",
            None,
            EdgeKind::Calls
        )));
    }
}
