use context_extractor::{content_hash, EdgeKind, ExtractorConfig, SymbolExtractor, SymbolKind};
use pretty_assertions::assert_eq;

#[test]
fn re_extracting_unchanged_content_yields_identical_symbols() {
    let src = br#"
class Cart:
    def total(self):
        return sum_items(self.items)

def sum_items(items):
    return 0
"#;
    let extractor = SymbolExtractor::new(ExtractorConfig::default());
    let first = extractor.extract("shop/cart.py", src);
    let second = extractor.extract("shop/cart.py", src);

    assert_eq!(first.symbols, second.symbols);
    assert_eq!(first.contains, second.contains);
    assert_eq!(first.references, second.references);
}

#[test]
fn nested_rust_modules_qualify_ids() {
    let src = br#"
mod api {
    pub struct Client;

    impl Client {
        pub fn send(&self) {}
    }

    mod retry {
        pub fn backoff() {}
    }
}
"#;
    let extraction = SymbolExtractor::default().extract("src/lib.rs", src);
    let ids: Vec<&str> = extraction.symbols.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "file:src/lib.rs",
            "class:src/lib.rs:api.Client",
            "function:src/lib.rs:api.Client.send",
            "function:src/lib.rs:api.retry.backoff",
        ]
    );

    let send = &extraction.symbols[2];
    assert_eq!(send.name, "send");
    assert_eq!(send.qualified_name, "api.Client.send");
    assert!(extraction.contains.iter().any(|e| e.kind == EdgeKind::Contains
        && e.from == "class:src/lib.rs:api.Client"
        && e.to == send.id));
}

#[test]
fn tsx_components_are_functions() {
    let src = br#"import React from "react";

export function Button(props: Props) {
  return <button onClick={props.onClick}>{props.label}</button>;
}

export const Panel = () => <div><Button label="ok" /></div>;
"#;
    let extraction = SymbolExtractor::default().extract("ui/button.tsx", src);
    let functions: Vec<&str> = extraction
        .symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Function)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(functions, vec!["Button", "Panel"]);
    assert_eq!(extraction.language.as_deref(), Some("typescript"));
}

#[test]
fn every_symbol_hash_matches_its_source() {
    let src = b"fn a() { b(); }\nfn b() {}\nstruct S;\n";
    let extraction = SymbolExtractor::default().extract("x.rs", src);
    assert_eq!(extraction.symbols.len(), 4);
    for symbol in &extraction.symbols {
        assert_eq!(symbol.content_hash, content_hash(&symbol.source), "{}", symbol.id);
    }
    assert_eq!(extraction.symbols[0].content_hash, content_hash(src));
}
