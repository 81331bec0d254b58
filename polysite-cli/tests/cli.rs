use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// A project whose exports are confined to the project directory itself.
fn project() -> TempDir {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "polysite.yml",
        r#"
paths:
  content: "content"
  output: "out"
languages:
  - de
  - tag: en
    name: English
export:
  safe_root: "."
"#,
    );
    write(
        dir.path(),
        "content/layout.html",
        "<html lang=\"{{ lang.tag }}\">{% block content %}{% endblock content %}</html>",
    );
    write(dir.path(), "content/index/de.md", "# Startseite");
    write(dir.path(), "content/index/en.md", "# Home");
    write(dir.path(), "content/legal/de.html", "<p>Impressum</p>");
    write(dir.path(), "content/ads.txt", "ads");
    dir
}

#[allow(deprecated)]
fn polysite(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("polysite").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn build_exports_every_page() {
    let dir = project();
    polysite(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 4 pages and copied 1 files"));

    let out = dir.path().join("out");
    assert_eq!(fs::read_to_string(out.join("ads.txt")).unwrap(), "ads");
    let legal = fs::read_to_string(out.join("en/legal.html")).unwrap();
    assert_eq!(legal, "<html lang=\"en\"><p>Impressum</p></html>");
    assert!(fs::read_to_string(out.join("de/index.html"))
        .unwrap()
        .contains("Startseite"));
}

#[test]
fn build_refuses_output_outside_safe_root() {
    let dir = project();
    let elsewhere = tempdir().unwrap();
    let target = elsewhere.path().join("site");

    polysite(dir.path())
        .arg("build")
        .arg("--output")
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to write"));
    assert!(!target.exists());
}

#[test]
fn routes_json_reports_fallbacks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project();
    let assert = polysite(dir.path()).args(["routes", "--json"]).assert().success();
    let listing: Value = serde_json::from_slice(&assert.get_output().stdout)?;

    let pages = listing["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 4);
    let en_legal = pages
        .iter()
        .find(|p| p["route"] == "en/legal.html")
        .expect("en/legal.html listed");
    assert_eq!(en_legal["language"], "en");
    assert_eq!(en_legal["fragment"], "de");
    assert_eq!(listing["passthrough"], serde_json::json!(["ads.txt"]));
    Ok(())
}

#[test]
fn routes_text_marks_fallbacks() {
    let dir = project();
    polysite(dir.path())
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("/en/legal.html\tde (fallback)"))
        .stdout(predicate::str::contains("/de/legal.html\tde\n"))
        .stdout(predicate::str::contains("/ads.txt\tpass-through"));
}

#[test]
fn invalid_fragment_name_fails_build() {
    let dir = project();
    write(dir.path(), "content/index/en_GB.md", "# Broken");

    polysite(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("en_GB.md"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_config_is_reported() {
    let dir = tempdir().unwrap();
    polysite(dir.path())
        .arg("routes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
