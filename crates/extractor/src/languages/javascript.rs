use crate::language::Language;
use crate::parser::{
    field_text, leading_comments, normalize_module_path, span_text, split_module, Definition,
    RawReference, SourceParser, Visit,
};
use crate::types::{EdgeKind, SymbolKind};
use tree_sitter::Node;

/// JavaScript, TypeScript and TSX share one grammar family
pub struct JavaScriptParser {
    language: Language,
}

impl JavaScriptParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl SourceParser for JavaScriptParser {
    fn language(&self) -> Language {
        self.language
    }

    fn classify<'t>(&self, node: Node<'t>, src: &str) -> Visit<'t> {
        let kind = match node.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition"
            | "method_signature" | "abstract_method_signature" => SymbolKind::Function,
            "class_declaration" | "abstract_class_declaration" | "interface_declaration"
            | "enum_declaration" => SymbolKind::Class,
            "variable_declarator" => return bound_function(node, src),
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
            "new_expression" => {
                if let Some((name, qualifier)) = node
                    .child_by_field_name("constructor")
                    .and_then(|c| callee(c, src))
                {
                    out.push(RawReference::new(name, qualifier, EdgeKind::Calls, node));
                }
            }
            "import_statement" => collect_import(node, src, out),
            "class_heritage" => {
                // Plain JavaScript: `extends <expression>`
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if let Some((name, qualifier)) = callee(child, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, child));
                    }
                }
            }
            "extends_clause" => {
                let mut cursor = node.walk();
                for value in node.children_by_field_name("value", &mut cursor) {
                    if let Some((name, qualifier)) = callee(value, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, value));
                    }
                }
            }
            "implements_clause" => {
                let mut cursor = node.walk();
                for ty in node.named_children(&mut cursor) {
                    if let Some((name, qualifier)) = type_path(ty, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, ty));
                    }
                }
            }
            "extends_type_clause" => {
                let mut cursor = node.walk();
                for ty in node.children_by_field_name("type", &mut cursor) {
                    if let Some((name, qualifier)) = type_path(ty, src) {
                        out.push(RawReference::new(name, qualifier, EdgeKind::Inherits, ty));
                    }
                }
            }
            _ => {}
        }
    }

    fn docstring(&self, definition: &Definition<'_>, src: &str) -> Option<String> {
        let anchor = definition.doc_anchor.unwrap_or(definition.span);
        leading_comments(
            src,
            anchor.start_position().row,
            |line| line.starts_with("//") || line.starts_with("/*") || line.starts_with('*'),
            |line| line.starts_with('@'),
            |line| {
                line.trim_start_matches('/')
                    .trim_start_matches('*')
                    .trim_end_matches("*/")
            },
        )
    }
}

/// `const login = async (user) => {...}` defines function `login`
fn bound_function<'t>(node: Node<'t>, src: &str) -> Visit<'t> {
    let Some(value) = node.child_by_field_name("value") else {
        return Visit::Descend;
    };
    if !matches!(
        value.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    ) {
        return Visit::Descend;
    }
    let Some(name) = node
        .child_by_field_name("name")
        .filter(|n| n.kind() == "identifier")
        .map(|n| span_text(src, n))
    else {
        return Visit::Descend;
    };

    // A sole declarator owns its whole `const ... ;` statement
    let span = node
        .parent()
        .filter(|p| {
            matches!(p.kind(), "lexical_declaration" | "variable_declaration")
                && p.named_child_count() == 1
        })
        .unwrap_or(node);
    let mut definition = Definition::new(SymbolKind::Function, name, span)
        .with_body(value.child_by_field_name("body"));
    definition.doc_anchor = Some(span);
    Visit::Definition(definition)
}

fn callee(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" => Some((span_text(src, node).to_string(), None)),
        "member_expression" => {
            let property = field_text(src, node, "property")?;
            let receiver = node
                .child_by_field_name("object")
                .filter(|o| matches!(o.kind(), "identifier" | "this" | "member_expression"))
                .map(|o| span_text(src, o).to_string());
            Some((property.to_string(), receiver))
        }
        _ => None,
    }
}

fn type_path(node: Node<'_>, src: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "type_identifier" | "identifier" => Some((span_text(src, node).to_string(), None)),
        "generic_type" => {
            let name = node.child_by_field_name("name")?;
            type_path(name, src)
        }
        "nested_type_identifier" => {
            let name = field_text(src, node, "name")?;
            let module = field_text(src, node, "module").map(normalize_module_path);
            Some((name.to_string(), module))
        }
        _ => None,
    }
}

fn collect_import(node: Node<'_>, src: &str, out: &mut Vec<RawReference>) {
    let Some(module) = field_text(src, node, "source").map(normalize_module_path) else {
        return;
    };
    let module_ref = |out: &mut Vec<RawReference>| {
        if let Some((name, parent)) = split_module(&module) {
            out.push(RawReference::new(name, parent, EdgeKind::Imports, node));
        }
    };
    let qualifier = (!module.is_empty()).then(|| module.clone());

    let mut cursor = node.walk();
    let Some(clause) = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_clause")
    else {
        // Side-effect import: `import './polyfill'`
        module_ref(out);
        return;
    };

    let mut clause_cursor = clause.walk();
    for part in clause.named_children(&mut clause_cursor) {
        match part.kind() {
            "identifier" => out.push(RawReference::new(
                span_text(src, part),
                qualifier.clone(),
                EdgeKind::Imports,
                node,
            )),
            "namespace_import" => module_ref(out),
            "named_imports" => {
                let mut spec_cursor = part.walk();
                for spec in part.named_children(&mut spec_cursor) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    if let Some(name) = field_text(src, spec, "name") {
                        out.push(RawReference::new(
                            name,
                            qualifier.clone(),
                            EdgeKind::Imports,
                            node,
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn refs(
        extraction: &crate::types::Extraction,
    ) -> Vec<(String, String, Option<String>, EdgeKind)> {
        extraction
            .references
            .iter()
            .map(|r| (r.from.clone(), r.name.clone(), r.qualifier.clone(), r.kind))
            .collect()
    }

    #[test]
    fn javascript_functions_classes_and_arrows() {
        let src = r#"import { hash } from './crypto';
import * as db from '../db/client';

/** Authenticate a user. */
export const login = async (user) => {
  return hash(user.password);
};

class Session extends BaseSession {
  // Close it.
  close() {
    db.release(this);
    new Audit('close');
  }
}

function helper() {}
"#;
        let extraction = JavaScriptParser::new(Language::JavaScript).extract("src/auth.js", src);
        let ids: Vec<&str> = extraction.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "file:src/auth.js",
                "function:src/auth.js:login",
                "class:src/auth.js:Session",
                "function:src/auth.js:Session.close",
                "function:src/auth.js:helper",
            ]
        );

        let login = &extraction.symbols[1];
        assert_eq!(login.docstring.as_deref(), Some("Authenticate a user."));
        assert_eq!(login.range.start_line, 5);
        assert_eq!(login.range.end_line, 7);
        assert!(login.source.starts_with("const login"));
        assert_eq!(extraction.symbols[3].docstring.as_deref(), Some("Close it."));

        let refs = refs(&extraction);
        let has = |from: &str, name: &str, qualifier: Option<&str>, kind: EdgeKind| {
            refs.contains(&(
                from.to_string(),
                name.to_string(),
                qualifier.map(str::to_string),
                kind,
            ))
        };
        assert!(has("file:src/auth.js", "hash", Some("crypto"), EdgeKind::Imports));
        assert!(has("file:src/auth.js", "client", Some("db"), EdgeKind::Imports));
        assert!(has("function:src/auth.js:login", "hash", None, EdgeKind::Calls));
        assert!(has("class:src/auth.js:Session", "BaseSession", None, EdgeKind::Inherits));
        assert!(has(
            "function:src/auth.js:Session.close",
            "release",
            Some("db"),
            EdgeKind::Calls
        ));
        assert!(has("function:src/auth.js:Session.close", "Audit", None, EdgeKind::Calls));
    }

    #[test]
    fn typescript_interfaces_and_heritage() {
        let src = r#"import { Repo } from "./repo";

export interface Store extends Base<string> {
  get(id: string): string;
}

export class MemoryStore extends Repo implements Store {
  get(id: string): string {
    return lookup(id);
  }
}
"#;
        let extraction = JavaScriptParser::new(Language::TypeScript).extract("store.ts", src);
        let ids: Vec<&str> = extraction.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "file:store.ts",
                "class:store.ts:Store",
                "function:store.ts:Store.get",
                "class:store.ts:MemoryStore",
                "function:store.ts:MemoryStore.get",
            ]
        );

        let refs = refs(&extraction);
        let inherits: Vec<(&str, &str)> = refs
            .iter()
            .filter(|r| r.3 == EdgeKind::Inherits)
            .map(|r| (r.0.as_str(), r.1.as_str()))
            .collect();
        assert_eq!(
            inherits,
            vec![
                ("class:store.ts:MemoryStore", "Repo"),
                ("class:store.ts:MemoryStore", "Store"),
                ("class:store.ts:Store", "Base"),
            ]
        );
        assert!(extraction.diagnostics.is_empty());
    }
}
