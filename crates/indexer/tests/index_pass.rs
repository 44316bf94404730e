use context_extractor::{content_hash, EdgeKind};
use context_graph::ImpactAnalyzer;
use context_indexer::{CancelFlag, IndexOptions, IndexerError, ProjectIndexer};
use context_store::{lock_path, snapshot_path, ContextStore, StoreError, StoreLock};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

async fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.expect("mkdir");
    }
    tokio::fs::write(path, contents).await.expect("write file");
}

async fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    for (path, contents) in files {
        write(temp.path(), path, contents).await;
    }
    ContextStore::init(temp.path()).await.expect("init store");
    temp
}

async fn index(root: &Path) -> context_indexer::IndexStats {
    ProjectIndexer::new(root)
        .await
        .expect("indexer")
        .index()
        .await
        .expect("index pass")
}

const A_PY: &str = "def foo():\n    return 1\n";
const B_PY: &str = "from a import foo\n\ndef bar():\n    return foo()\n";

#[tokio::test]
async fn cross_file_call_shows_up_in_impacts() {
    let temp = project(&[("a.py", A_PY), ("b.py", B_PY)]).await;
    let stats = index(temp.path()).await;
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.extracted, 2);
    assert_eq!(stats.generation, 1);

    let store = ContextStore::load(temp.path()).await.expect("load");
    assert!(store
        .all_edges()
        .any(|e| e.from == "function:b.py:bar" && e.to == "function:a.py:foo" && e.kind == EdgeKind::Calls));
    assert!(store
        .all_edges()
        .any(|e| e.from == "file:b.py" && e.to == "function:a.py:foo" && e.kind == EdgeKind::Imports));

    let report = ImpactAnalyzer::new(&store)
        .analyze("function:a.py:foo", None)
        .expect("impacts");
    let direct: Vec<&str> = report.direct().map(|e| e.symbol.id.as_str()).collect();
    assert_eq!(direct, vec!["file:b.py", "function:b.py:bar"]);
}

#[tokio::test]
async fn every_edge_endpoint_and_hash_checks_out() {
    let temp = project(&[
        ("a.py", A_PY),
        ("b.py", B_PY),
        ("src/lib.rs", "pub struct Point;\n\nimpl Point {\n    pub fn norm(&self) -> f64 {\n        helper()\n    }\n}\n\nfn helper() -> f64 {\n    1.0\n}\n"),
        ("web/app.ts", "import { render } from './view';\n\nexport class App {\n  start() {\n    render();\n  }\n}\n"),
        ("web/view.ts", "export function render(): void {}\n"),
    ])
    .await;
    index(temp.path()).await;

    let store = ContextStore::load(temp.path()).await.expect("load");
    for edge in store.all_edges() {
        assert!(store.get(&edge.from).is_ok(), "dangling from {}", edge.from);
        assert!(store.get(&edge.to).is_ok(), "dangling to {}", edge.to);
    }
    for symbol in store.all_symbols() {
        assert_eq!(content_hash(&symbol.source), symbol.content_hash, "{}", symbol.id);
    }
    for path in ["a.py", "b.py", "src/lib.rs", "web/app.ts", "web/view.ts"] {
        assert!(store.get(&format!("file:{path}")).is_ok());
    }
    assert!(store
        .all_edges()
        .any(|e| e.from == "function:web/app.ts:App.start" && e.to == "function:web/view.ts:render"));
    assert!(store
        .all_edges()
        .any(|e| e.from == "function:src/lib.rs:Point.norm" && e.to == "function:src/lib.rs:helper"));
}

#[tokio::test]
async fn go_package_links_across_files() {
    let temp = project(&[
        ("shop/server.go", "package shop\n\ntype Server struct {\n\tBase\n}\n\nfunc (s *Server) Start() {\n\tnormalize()\n}\n"),
        ("shop/util.go", "package shop\n\ntype Base struct{}\n\nfunc normalize() {}\n"),
    ])
    .await;
    let stats = index(temp.path()).await;
    assert_eq!(stats.languages.get("go"), Some(&2));

    let store = ContextStore::load(temp.path()).await.expect("load");
    let edges: Vec<(&str, &str, EdgeKind)> = store
        .all_edges()
        .map(|e| (e.from.as_str(), e.to.as_str(), e.kind))
        .collect();
    assert!(edges.contains(&(
        "function:shop/server.go:Server.Start",
        "function:shop/util.go:normalize",
        EdgeKind::Calls
    )));
    assert!(edges.contains(&(
        "class:shop/server.go:Server",
        "class:shop/util.go:Base",
        EdgeKind::Inherits
    )));
    assert!(edges.contains(&(
        "class:shop/server.go:Server",
        "function:shop/server.go:Server.Start",
        EdgeKind::Contains
    )));
}

#[tokio::test]
async fn unchanged_tree_is_idempotent_modulo_generation() {
    let temp = project(&[("a.py", A_PY), ("b.py", B_PY)]).await;
    index(temp.path()).await;
    let first = ContextStore::load(temp.path()).await.expect("load").snapshot().clone();

    let stats = index(temp.path()).await;
    assert_eq!(stats.extracted, 0);
    assert_eq!(stats.unchanged, 2);
    assert_eq!(stats.generation, first.generation + 1);

    let second = ContextStore::load(temp.path()).await.expect("load").snapshot().clone();
    assert_eq!(second.symbols, first.symbols);
    assert_eq!(second.edges, first.edges);
    assert_eq!(second.files, first.files);
}

#[tokio::test]
async fn modifying_one_file_reextracts_only_that_file() {
    let temp = project(&[("a.py", A_PY), ("b.py", B_PY)]).await;
    index(temp.path()).await;
    let before = ContextStore::load(temp.path()).await.expect("load");
    let a_record = before.file_record("a.py").cloned().expect("a.py record");
    let a_symbols: Vec<_> = before.list_by_file("a.py").cloned().collect();

    write(
        temp.path(),
        "b.py",
        "from a import foo\n\ndef bar():\n    return foo() + 1\n\ndef baz():\n    return bar()\n",
    )
    .await;
    let stats = index(temp.path()).await;
    assert_eq!(stats.extracted, 1);
    assert_eq!(stats.unchanged, 1);

    let after = ContextStore::load(temp.path()).await.expect("load");
    assert_eq!(after.file_record("a.py"), Some(&a_record));
    assert_eq!(after.list_by_file("a.py").cloned().collect::<Vec<_>>(), a_symbols);
    assert!(after.get("function:b.py:baz").is_ok());

    let report = ImpactAnalyzer::new(&after)
        .analyze("function:a.py:foo", None)
        .expect("impacts");
    let found: Vec<(&str, usize)> = report
        .entries
        .iter()
        .map(|e| (e.symbol.id.as_str(), e.depth))
        .collect();
    assert_eq!(
        found,
        vec![("file:b.py", 1), ("function:b.py:bar", 1), ("function:b.py:baz", 2)]
    );
}

#[tokio::test]
async fn deleted_files_leave_no_trace() {
    let temp = project(&[("a.py", A_PY), ("b.py", B_PY)]).await;
    index(temp.path()).await;

    tokio::fs::remove_file(temp.path().join("a.py"))
        .await
        .expect("delete a.py");
    let stats = index(temp.path()).await;
    assert_eq!(stats.removed, 1);

    let store = ContextStore::load(temp.path()).await.expect("load");
    assert!(matches!(store.get("file:a.py"), Err(StoreError::NotFound(_))));
    assert!(store
        .all_edges()
        .all(|e| !e.from.contains(":a.py") && !e.to.contains(":a.py")));
    let notes = &store.file_record("b.py").expect("b.py record").notes;
    assert!(notes.iter().any(|n| n.message.contains("foo")));
}

#[tokio::test]
async fn new_definition_resolves_previously_unresolved_reference() {
    let temp = project(&[("b.py", B_PY)]).await;
    index(temp.path()).await;
    let store = ContextStore::load(temp.path()).await.expect("load");
    assert!(store.dependencies_of("function:b.py:bar").next().is_none());

    write(temp.path(), "a.py", A_PY).await;
    index(temp.path()).await;
    let store = ContextStore::load(temp.path()).await.expect("load");
    let deps: Vec<&str> = store
        .dependencies_of("function:b.py:bar")
        .map(|(_, s)| s.id.as_str())
        .collect();
    assert_eq!(deps, vec!["function:a.py:foo"]);
}

#[tokio::test]
async fn scoped_pass_only_removes_inside_scope() {
    let temp = project(&[("pkg/one.py", "def one():\n    pass\n"), ("top.py", "def top():\n    pass\n")]).await;
    index(temp.path()).await;

    tokio::fs::remove_file(temp.path().join("top.py"))
        .await
        .expect("delete top.py");
    let indexer = ProjectIndexer::new(temp.path()).await.expect("indexer");
    let stats = indexer
        .index_with(IndexOptions::default().with_scope("pkg"))
        .await
        .expect("scoped pass");
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.removed, 0);

    let store = ContextStore::load(temp.path()).await.expect("load");
    assert!(store.file_record("top.py").is_some());

    let err = indexer
        .index_with(IndexOptions::default().with_scope("/"))
        .await
        .expect_err("outside root");
    assert!(matches!(err, IndexerError::InvalidPath(_)));
}

/// Rewrite the stored snapshot in the version 1 layout
async fn downgrade_to_v1(root: &Path) {
    let path = snapshot_path(root);
    let bytes = tokio::fs::read(&path).await.expect("read snapshot");
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).expect("snapshot json");
    let object = value.as_object_mut().expect("snapshot object");
    object.insert("version".to_string(), serde_json::Value::from(1u32));
    object.remove("generation");
    let files = object
        .get_mut("files")
        .and_then(serde_json::Value::as_object_mut)
        .expect("files");
    for record in files.values_mut() {
        let record = record.as_object_mut().expect("file record");
        for field in ["references", "notes", "language"] {
            record.remove(field);
        }
    }
    tokio::fs::write(&path, serde_json::to_vec(&value).expect("encode"))
        .await
        .expect("write snapshot");
}

#[tokio::test]
async fn migrated_store_relinks_every_file_on_next_pass() {
    let temp = project(&[
        ("a.py", A_PY),
        ("b.py", B_PY),
        ("c.py", "def qux():\n    return 2\n"),
    ])
    .await;
    index(temp.path()).await;
    downgrade_to_v1(temp.path()).await;

    write(temp.path(), "c.py", "def qux():\n    return 3\n").await;
    let stats = index(temp.path()).await;
    assert_eq!(stats.extracted, 3);
    assert_eq!(stats.generation, 1);

    let store = ContextStore::load(temp.path()).await.expect("load");
    assert!(store
        .all_edges()
        .any(|e| e.from == "function:b.py:bar" && e.to == "function:a.py:foo" && e.kind == EdgeKind::Calls));
    assert!(!store.file_record("b.py").expect("b.py record").references.is_empty());

    let report = ImpactAnalyzer::new(&store)
        .analyze("function:a.py:foo", None)
        .expect("impacts");
    assert!(report.direct().any(|e| e.symbol.id == "function:b.py:bar"));

    let again = index(temp.path()).await;
    assert_eq!(again.extracted, 0);
    assert_eq!(again.unchanged, 3);
}

#[tokio::test]
async fn uninitialized_project_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    write(temp.path(), "a.py", A_PY).await;
    let err = ProjectIndexer::new(temp.path())
        .await
        .expect("indexer")
        .index()
        .await
        .expect_err("no store");
    assert!(matches!(err, IndexerError::Store(StoreError::NotInitialized(_))));
    assert!(err.to_string().contains("run `init` first"));
    assert!(!lock_path(temp.path()).exists());
}

#[tokio::test]
async fn concurrent_writer_gets_store_busy() {
    let temp = project(&[("a.py", A_PY)]).await;
    let root = tokio::fs::canonicalize(temp.path()).await.expect("canonical");
    let _held = StoreLock::acquire(&root).await.expect("first lock");

    let err = ProjectIndexer::new(temp.path())
        .await
        .expect("indexer")
        .index()
        .await
        .expect_err("busy");
    assert!(matches!(err, IndexerError::Store(StoreError::StoreBusy(_))));
}

#[tokio::test]
async fn cancelled_pass_keeps_last_commit() {
    let temp = project(&[("a.py", A_PY)]).await;
    index(temp.path()).await;
    write(temp.path(), "b.py", B_PY).await;

    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = ProjectIndexer::new(temp.path())
        .await
        .expect("indexer")
        .index_with(IndexOptions::default().with_cancel(cancel))
        .await
        .expect_err("cancelled");
    assert!(matches!(err, IndexerError::Cancelled));

    let store = ContextStore::load(temp.path()).await.expect("load");
    assert_eq!(store.generation(), 1);
    assert!(store.file_record("b.py").is_none());
}
