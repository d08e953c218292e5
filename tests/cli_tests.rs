//! Integration tests for CLI

mod common;

use assert_cmd::Command;
use common::{read_part, write_template};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn slide_merge() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("slide-merge"))
}

fn generated_outputs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("output_"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_cli_help() {
    slide_merge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("one slide per row"))
        .stdout(predicate::str::contains("--template"))
        .stdout(predicate::str::contains("--data"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn test_resolves_inputs_from_working_directory() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "certificates.pptx", false);
    fs::write(dir.path().join("people.csv"), "Name,Score\nAlice,95\nBob,87\n").unwrap();

    slide_merge()
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Created: "));

    let outputs = generated_outputs(dir.path());
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].ends_with(".pptx"));
    assert_eq!(outputs[0].len(), "output_20240517_120304.pptx".len());

    let slide = read_part(&dir.path().join(&outputs[0]), "ppt/slides/slide2.xml");
    assert!(slide.contains("<a:t>Bob</a:t>"));
}

#[test]
fn test_explicit_paths_and_output_name() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("templates");
    fs::create_dir(&templates).unwrap();
    write_template(&templates, "certificates.pptx", false);
    fs::write(dir.path().join("people.csv"), "Name\nAlice\n").unwrap();

    slide_merge()
        .args(["-C", dir.path().to_str().unwrap()])
        .args(["-t", "templates/certificates.pptx", "-d", "people.csv", "-o", "filled.pptx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filled.pptx"));

    let slide = read_part(&templates.join("filled.pptx"), "ppt/slides/slide1.xml");
    assert!(slide.contains("<a:t>Alice</a:t>"));
}

#[test]
fn test_ambiguous_template_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "a.pptx", false);
    write_template(dir.path(), "b.pptx", false);
    fs::write(dir.path().join("people.csv"), "Name\nAlice\n").unwrap();

    slide_merge()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Multiple .pptx files found: a.pptx, b.pptx"));

    assert!(generated_outputs(dir.path()).is_empty());
}

#[test]
fn test_xlsx_is_preferred_over_csv() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "certificates.pptx", false);
    fs::write(dir.path().join("a.csv"), "Name\nFrom CSV\n").unwrap();
    fs::write(dir.path().join("b.csv"), "Name\nAlso CSV\n").unwrap();

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(1, 0, "From XLSX").unwrap();
    workbook.save(dir.path().join("people.xlsx")).unwrap();

    slide_merge()
        .current_dir(dir.path())
        .args(["-o", "out.pptx"])
        .assert()
        .success();

    let slide = read_part(&dir.path().join("out.pptx"), "ppt/slides/slide1.xml");
    assert!(slide.contains("<a:t>From XLSX</a:t>"));
}

#[test]
fn test_missing_data_file_names_flag() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "certificates.pptx", false);

    slide_merge()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No .xlsx or .csv file found. Specify with -d flag."));
}

#[test]
fn test_header_only_data_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "certificates.pptx", false);
    fs::write(dir.path().join("people.csv"), "Name,Score\n").unwrap();

    slide_merge()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no data rows"));

    assert!(generated_outputs(dir.path()).is_empty());
}
