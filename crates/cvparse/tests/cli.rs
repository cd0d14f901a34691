use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WARSAW_CV: &str = "Jan Kowalski\n\
                         jan.kowalski@example.pl\n\
                         Edukacja\n\
                         Politechnika Warszawska w Warszawie kierunek Informatyka 2010 - 2015\n\
                         Umiejętności\n\
                         Rust, SQL\n";

/// Command isolated from the user's config file and environment.
fn cvparse(dir: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("cvparse").into();
    cmd.current_dir(dir);
    cmd.env("NO_COLOR", "1");
    cmd.env("XDG_CONFIG_HOME", dir.join("config-home"));
    cmd.env_remove("CVPARSE_REFERENCE_DATE");
    cmd.env_remove("CVPARSE_RAW_TEXT_DIR");
    cmd.env_remove("CVPARSE_RECOGNIZER_CMD");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    let mut cmd: Command = cargo_bin_cmd!("cvparse").into();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cvparse"));
}

// --- Mock ---

#[test]
fn mock_prints_placeholder() {
    let tmp = TempDir::new().unwrap();
    cvparse(tmp.path())
        .arg("mock")
        .assert()
        .success()
        .stdout(predicate::str::contains("undefined@undefined.com"))
        .stdout(predicate::str::contains("\"date_of_birth\": \"1901-01-01\""));
}

#[test]
fn mock_writes_output_file() {
    let tmp = TempDir::new().unwrap();
    cvparse(tmp.path())
        .args(["mock", "-o", "mock.json"])
        .assert()
        .success();

    let json = fs::read_to_string(tmp.path().join("mock.json")).unwrap();
    assert!(json.contains("UNDEFINED"));
}

// --- Parse ---

#[test]
fn parse_prints_education() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);

    cvparse(tmp.path())
        .args(["parse", "cv.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"institution\": \"Politechnika Warszawska w Warszawie\"",
        ))
        .stdout(predicate::str::contains("\"start_date\": \"2010-01-01\""))
        .stdout(predicate::str::contains("\"end_date\": \"2015-12-31\""))
        .stdout(predicate::str::contains("jan.kowalski@example.pl"))
        .stderr(predicate::str::contains("1 education records"));
}

#[test]
fn parse_writes_output_and_raw_text() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);

    cvparse(tmp.path())
        .args(["parse", "cv.txt", "-o", "cv.json", "--dump-text", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let json = fs::read_to_string(tmp.path().join("cv.json")).unwrap();
    assert!(json.contains("Informatyka"));
    let raw = fs::read_to_string(tmp.path().join("raw").join("raw-cv.txt.txt")).unwrap();
    assert!(raw.starts_with("Jan Kowalski\n"));
    assert!(raw.ends_with("Rust, SQL"));
}

#[test]
fn parse_ongoing_uses_today_flag() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", "Edukacja\nUniwersytet Gdański 2021 - obecnie\n");

    cvparse(tmp.path())
        .args(["parse", "cv.txt", "--today", "2024-03-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"end_date\": \"2024-03-15\""));
}

#[test]
fn parse_ongoing_uses_reference_date_env() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", "Edukacja\nUniwersytet Gdański 2021 - obecnie\n");

    cvparse(tmp.path())
        .env("CVPARSE_REFERENCE_DATE", "2023-09-30")
        .args(["parse", "cv.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"end_date\": \"2023-09-30\""));
}

#[test]
fn parse_without_section_reports_it() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", "Doświadczenie\nFirma X 2010 - 2015\n");

    cvparse(tmp.path())
        .args(["parse", "cv.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"education\": []"))
        .stderr(predicate::str::contains("no education section"));
}

#[test]
fn parse_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    cvparse(tmp.path())
        .args(["parse", "missing.txt"])
        .assert()
        .failure();
}

#[test]
fn parse_pdf_is_unsupported() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.pdf", "%PDF-1.7");

    cvparse(tmp.path())
        .args(["parse", "cv.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn invalid_reference_date_env_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);

    cvparse(tmp.path())
        .env("CVPARSE_REFERENCE_DATE", "15.03.2024")
        .args(["parse", "cv.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CVPARSE_REFERENCE_DATE"));
}

#[test]
fn invalid_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);
    write(tmp.path(), "config.json", "not json");

    cvparse(tmp.path())
        .args(["--config", "config.json", "parse", "cv.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config JSON"));
}

#[test]
fn config_file_sets_reference_date() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", "Edukacja\nUniwersytet Gdański 2021 - obecnie\n");
    write(tmp.path(), "config.json", r#"{"reference_date": "2022-06-01"}"#);

    cvparse(tmp.path())
        .args(["parse", "cv.txt", "--config", "config.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"end_date\": \"2022-06-01\""));
}

// --- Batch ---

#[test]
fn batch_writes_one_json_per_document() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("cvs");
    fs::create_dir(&input).unwrap();
    write(&input, "a.txt", WARSAW_CV);
    write(&input, "b.md", "# CV\nEdukacja\nAkademia Morska w Gdyni 2001 - 2005\n");
    write(&input, "notes.pdf", "%PDF-1.7");

    cvparse(tmp.path())
        .args(["batch", "cvs", "-o", "out"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsed 2 of 2 documents"));

    let a = fs::read_to_string(tmp.path().join("out").join("a.json")).unwrap();
    let b = fs::read_to_string(tmp.path().join("out").join("b.json")).unwrap();
    assert!(a.contains("Politechnika Warszawska"));
    assert!(b.contains("Akademia Morska w Gdyni"));
    assert!(!tmp.path().join("out").join("notes.json").exists());
}

#[test]
fn batch_reports_failures() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("cvs");
    fs::create_dir(&input).unwrap();
    write(&input, "good.txt", WARSAW_CV);
    fs::write(input.join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();

    cvparse(tmp.path())
        .args(["batch", "cvs", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.txt"))
        .stderr(predicate::str::contains("1 documents failed"));

    assert!(tmp.path().join("out").join("good.json").exists());
}

// --- Inspect ---

#[test]
fn inspect_lists_resolved_spans() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);

    cvparse(tmp.path())
        .args(["inspect", "cv.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Section: Edukacja"))
        .stdout(predicate::str::contains("organization"))
        .stdout(predicate::str::contains("Politechnika Warszawska w Warszawie"))
        .stdout(predicate::str::contains("field_of_study"));
}

#[test]
fn inspect_json_output() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cv.txt", WARSAW_CV);

    let output = cvparse(tmp.path())
        .args(["inspect", "cv.txt", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let spans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = spans
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["organization", "field_of_study", "year", "year"]);
}
