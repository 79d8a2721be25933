use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn theme_script_prints_forcer() -> Result<(), Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .args(["theme", "script"])
        .assert()
        .success()
        .stdout(predicate::str::contains("setAttribute('data-theme','dark')"))
        .stdout(predicate::str::contains("localStorage.setItem('theme','dark')"));

    Ok(())
}

#[test]
fn theme_install_injects_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let site = dir.path().join("site");
    fs::create_dir_all(site.join("external"))?;
    fs::write(
        site.join("index.html"),
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Home</title>\n</head>\n<body></body>\n</html>\n",
    )?;
    fs::write(
        site.join("external/page.html"),
        "<html><head><title>Nested</title></head><body></body></html>",
    )?;
    fs::write(site.join("fragment.html"), "<p>no head here</p>")?;

    for _ in 0..2 {
        #[allow(deprecated)]
        Command::cargo_bin("zettel")?
            .current_dir(dir.path())
            .args(["theme", "install", "--site", "site"])
            .assert()
            .success();
    }

    let script = fs::read_to_string(site.join("force-dark.js"))?;
    assert!(script.contains("classList.add('dark-mode')"));

    let index = fs::read_to_string(site.join("index.html"))?;
    assert!(index.contains("<head>\n<script src=\"force-dark.js\"></script>\n<title>"));
    assert_eq!(index.matches("force-dark.js").count(), 1);

    let nested = fs::read_to_string(site.join("external/page.html"))?;
    assert!(nested.contains("<head>\n<script src=\"../force-dark.js\"></script><title>"));
    assert_eq!(nested.matches("force-dark.js").count(), 1);

    assert_eq!(
        fs::read_to_string(site.join("fragment.html"))?,
        "<p>no head here</p>"
    );

    Ok(())
}

#[test]
fn theme_install_respects_no_inject() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let site = dir.path().join("docs");
    fs::create_dir_all(&site)?;
    let page = "<html><head></head><body></body></html>";
    fs::write(site.join("index.html"), page)?;
    fs::write(
        dir.path().join("zettel.yml"),
        "paths:\n  output: docs\ntheme:\n  script: js/force-dark.js\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["theme", "install", "--no-inject"])
        .assert()
        .success();

    assert!(site.join("js/force-dark.js").exists());
    assert_eq!(fs::read_to_string(site.join("index.html"))?, page);

    Ok(())
}

#[test]
fn theme_install_requires_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("zettel")?
        .current_dir(dir.path())
        .args(["theme", "install", "--site", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));

    Ok(())
}
