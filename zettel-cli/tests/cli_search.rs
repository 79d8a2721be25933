use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PAYLOAD: &str = include_str!("../../zettel-core/tests/fixtures/lunr-pretext-search-index.js");

fn write_book(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site = root.join("site");
    fs::create_dir_all(&site)?;
    fs::write(
        root.join("zettel.yml"),
        r#"
site:
  title: "Topology Notes"
paths:
  output: "site"
search:
  limit: 3
"#,
    )?;
    fs::write(site.join("lunr-pretext-search-index.js"), PAYLOAD)?;
    Ok(())
}

#[test]
fn search_json_outputs_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_book(dir.path())?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "cauchy", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["kind"], "search.results");
    assert_eq!(value["data"]["style"], "textbook");
    assert_eq!(value["data"]["limit"], 3);

    let results = value["data"]["results"].as_array().expect("results array");
    assert!(!results.is_empty() && results.len() <= 3);
    let first = &results[0];
    assert_eq!(first["id"], "def-cauchy-sequence");
    assert_eq!(first["type"], "Definition");
    assert!(first["matches"]
        .as_object()
        .expect("match map")
        .contains_key("cauchi"));

    Ok(())
}

#[test]
fn search_text_groups_hits_by_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_book(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "cauchy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found"))
        .stdout(predicate::str::contains("  sec-convergence-sequences.html\n"))
        .stdout(predicate::str::contains(
            "(sec-convergence-sequences.html#def-cauchy-sequence)",
        ));

    Ok(())
}

#[test]
fn search_type_filter_and_misses() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_book(dir.path())?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "topology", "--json", "--types", "section", "--limit", "50"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let results = value["data"]["results"].as_array().expect("results array");
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["type"] == "Section"));

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "homeomorphism"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found for 'homeomorphism'"));

    Ok(())
}

#[test]
fn search_without_payload_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "metric"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Search payload not found"));

    Ok(())
}

#[test]
fn search_rejects_unknown_field() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_book(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["search", "author:knuth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid query"));

    Ok(())
}
