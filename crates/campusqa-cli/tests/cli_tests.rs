//! Integration tests for the campusqa binary
//!
//! Only commands that never reach the LLM service are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the user's config, prompts and corpus
fn campusqa_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("campusqa").unwrap();
    cmd.env("CAMPUSQA_CONFIG", dir.join("config.yml"))
        .env("CAMPUSQA_PROMPTS", dir.join("prompts.yml"))
        .env("CAMPUSQA_DOCUMENTS", dir.join("documents.json"))
        .env("CAMPUSQA_EMBEDDINGS", dir.join("embeddings.csv"))
        .env("CAMPUSQA_LLM_URL", "http://127.0.0.1:9")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_models_lists_registry() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("llama-3.1-8b-instant"))
        .stdout(predicate::str::contains("(default)"))
        .stdout(predicate::str::contains("llama-3.3-70b-versatile"))
        .stdout(predicate::str::contains("answer:"));
}

#[test]
fn test_models_json() {
    let dir = TempDir::new().unwrap();

    let output = campusqa_cmd(dir.path())
        .args(["--format", "json", "models"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["default"], "llama-3.1-8b-instant");
    assert_eq!(value["models"].as_array().unwrap().len(), 4);
    assert_eq!(value["stages"]["search"], "llama-3.1-8b-instant");
}

#[test]
fn test_prompts_show_defaults() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .args(["prompts", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== extract_query_prompt =="))
        .stdout(predicate::str::contains("== relevance_prompt =="))
        .stdout(predicate::str::contains("== extract_info_prompt =="))
        .stdout(predicate::str::contains("== answer_prompt =="))
        .stdout(predicate::str::contains("NO_RELEVANT_INFO"));
}

#[test]
fn test_prompts_set_then_reset() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .args(["prompts", "set", "search-query", "Keywords for: {query}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated extract_query_prompt"));
    assert!(dir.path().join("prompts.yml").exists());

    campusqa_cmd(dir.path())
        .args(["prompts", "show", "search-query"])
        .assert()
        .success()
        .stdout("Keywords for: {query}\n");

    // Other templates are untouched
    campusqa_cmd(dir.path())
        .args(["--format", "json", "prompts", "show", "answer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{context}"));

    campusqa_cmd(dir.path())
        .args(["prompts", "reset", "search-query"])
        .assert()
        .success();

    campusqa_cmd(dir.path())
        .args(["prompts", "show", "search-query"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extract the core search query"));
}

#[test]
fn test_prompts_set_from_file() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("relevance.txt");
    fs::write(&template, "Is {content} about {query}? Yes or No:").unwrap();

    campusqa_cmd(dir.path())
        .args(["prompts", "set", "relevance", "--file"])
        .arg(&template)
        .assert()
        .success();

    campusqa_cmd(dir.path())
        .args(["prompts", "show", "relevance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Is {content} about {query}?"));
}

#[test]
fn test_prompts_set_requires_text() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .args(["prompts", "set", "answer"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_ask_blank_query_rejected() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .args(["ask", "   "])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("query_text must not be empty"));
}

#[test]
fn test_ask_missing_corpus_fails() {
    let dir = TempDir::new().unwrap();

    campusqa_cmd(dir.path())
        .args(["ask", "Where is the library?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read documents"));
}

#[test]
fn test_retrieve_rejects_foreign_embeddings() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("documents.json"),
        r#"[{"URL": "https://uni.edu/library", "content": "The library opens at 8am."}]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("embeddings.csv"),
        "URL,0,1,2\nhttps://uni.edu/library,0.1,0.2,0.3\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("embeddings.csv.meta.json"),
        r#"{"model": "other-model", "dimensions": 3, "count": 1}"#,
    )
    .unwrap();

    campusqa_cmd(dir.path())
        .env("CAMPUSQA_EMBEDDING_MODEL", "query-model")
        .env("CAMPUSQA_EMBEDDING_DIMS", "3")
        .args(["retrieve", "library"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Index mismatch"))
        .stderr(predicate::str::contains("other-model"));
}
