use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn cli(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("context-aware").expect("binary");
    cmd.arg("--root").arg(root).arg("--quiet");
    cmd
}

fn run_cli_raw(root: &Path, args: &[&str]) -> (bool, Value) {
    let output = cli(root).args(args).output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

fn run_cli(root: &Path, args: &[&str]) -> Value {
    let (ok, body) = run_cli_raw(root, args);
    assert!(ok, "stdout: {body}\nargs: {args:?}");
    assert_eq!(body["status"], "ok");
    body
}

fn setup_repo() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("a.py"), "def foo():\n    \"\"\"Compute foo.\"\"\"\n    return 1\n").unwrap();
    fs::write(
        root.join("b.py"),
        "from a import foo\n\ndef bar():\n    return foo()\n\ndef baz():\n    return bar()\n",
    )
    .unwrap();
    temp
}

fn indexed_repo() -> tempfile::TempDir {
    let temp = setup_repo();
    run_cli(temp.path(), &["init"]);
    run_cli(temp.path(), &["index"]);
    temp
}

#[test]
fn index_requires_init() {
    let temp = setup_repo();
    let (ok, body) = run_cli_raw(temp.path(), &["index"]);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "not_initialized");
    let message = body["error"]["message"].as_str().expect("message");
    assert!(message.contains("run `init` first"), "{message}");
    assert!(!message.contains("lock"), "{message}");
}

#[test]
fn init_twice_is_rejected() {
    let temp = setup_repo();
    run_cli(temp.path(), &["init"]);
    let (ok, body) = run_cli_raw(temp.path(), &["init"]);
    assert!(!ok);
    assert_eq!(body["error"]["code"], "already_initialized");
}

#[test]
fn index_reports_stats() {
    let temp = setup_repo();
    run_cli(temp.path(), &["init"]);
    let body = run_cli(temp.path(), &["index"]);
    assert_eq!(body["data"]["scanned"], 2);
    assert_eq!(body["data"]["generation"], 1);
    assert_eq!(body["data"]["languages"]["python"], 2);

    let again = run_cli(temp.path(), &["index"]);
    assert_eq!(again["data"]["extracted"], 0);
    assert_eq!(again["data"]["unchanged"], 2);
}

#[test]
fn impacts_groups_cascade_by_depth() {
    let temp = indexed_repo();
    let body = run_cli(temp.path(), &["impacts", "function:a.py:foo"]);
    let direct: Vec<&str> = body["data"]["direct"]
        .as_array()
        .expect("direct array")
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(direct.contains(&"function:b.py:bar"));

    let cascade = body["data"]["cascade"].as_array().expect("cascade array");
    assert_eq!(cascade[0]["depth"], 1);
    assert_eq!(cascade[1]["depth"], 2);
    assert_eq!(cascade[1]["symbols"][0]["id"], "function:b.py:baz");

    let limited = run_cli(
        temp.path(),
        &["impacts", "function:a.py:foo", "--max-depth", "1"],
    );
    assert_eq!(limited["data"]["cascade"].as_array().unwrap().len(), 1);
}

#[test]
fn unknown_symbol_is_not_found() {
    let temp = indexed_repo();
    for command in ["read", "impacts"] {
        let (ok, body) = run_cli_raw(temp.path(), &[command, "function:a.py:missing"]);
        assert!(!ok);
        assert_eq!(body["error"]["code"], "not_found");
    }
}

#[test]
fn read_returns_source_children_and_dependencies() {
    let temp = indexed_repo();
    let body = run_cli(temp.path(), &["read", "function:b.py:bar"]);
    assert_eq!(body["data"]["source"], "def bar():\n    return foo()");
    assert_eq!(body["data"]["symbol"]["signature"], "def bar()");
    let deps = body["data"]["dependencies"].as_array().expect("deps");
    assert!(deps
        .iter()
        .any(|d| d["id"] == "function:a.py:foo" && d["kind"] == "calls"));

    let file = run_cli(temp.path(), &["read", "file:b.py"]);
    let children: Vec<&str> = file["data"]["children"]
        .as_array()
        .expect("children")
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["function:b.py:bar", "function:b.py:baz"]);
}

#[test]
fn search_ranks_and_handles_no_match() {
    let temp = indexed_repo();
    let body = run_cli(temp.path(), &["search", "foo"]);
    let hits = body["data"]["hits"].as_array().expect("hits");
    assert_eq!(hits[0]["id"], "function:a.py:foo");
    assert_eq!(hits[0]["doc"], "Compute foo.");

    let empty = run_cli(temp.path(), &["search", "refactor login"]);
    assert!(empty["data"]["hits"].as_array().unwrap().is_empty());

    let typed = run_cli(temp.path(), &["search", "bar", "--type", "function", "--limit", "1"]);
    assert_eq!(typed["data"]["hits"].as_array().unwrap().len(), 1);

    let functions = run_cli(temp.path(), &["search", "bar", "--type", "function"]);
    let kinds: Vec<&str> = functions["data"]["hits"]
        .as_array()
        .expect("hits")
        .iter()
        .map(|h| h["kind"].as_str().unwrap())
        .collect();
    assert!(!kinds.is_empty());
    assert!(kinds.iter().all(|kind| *kind == "function"), "{kinds:?}");

    cli(temp.path())
        .args(["search", "bar", "--type", "widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown symbol type"));
}

#[test]
fn semantic_search_falls_back_with_warning() {
    let temp = indexed_repo();
    let body = run_cli(temp.path(), &["search", "foo", "--semantic"]);
    assert_eq!(body["data"]["hits"][0]["id"], "function:a.py:foo");
    assert_eq!(body["warnings"][0]["kind"], "rerank_unavailable");
}

#[test]
fn search_output_writes_file() {
    let temp = indexed_repo();
    let out = temp.path().join("hits.json");
    let body = run_cli(
        temp.path(),
        &["search", "foo", "--output", out.to_str().unwrap()],
    );
    assert!(body["data"]["count"].as_u64().unwrap() >= 1);
    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written[0]["id"], "function:a.py:foo");
}

#[test]
fn structure_lists_files() {
    let temp = indexed_repo();
    let body = run_cli(temp.path(), &["structure"]);
    assert_eq!(body["data"]["totals"]["files"], 2);
    assert_eq!(body["data"]["totals"]["functions"], 3);
}

#[test]
fn export_renders_mermaid() {
    let temp = indexed_repo();
    cli(temp.path())
        .args(["export"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph LR"))
        .stdout(predicate::str::contains("-->|calls|"));

    cli(temp.path())
        .args(["export", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"edges\""));
}
