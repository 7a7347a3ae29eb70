//! Integration tests for the icpsr-filter CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A 130-byte record with `code` at byte offset 100 (column 101)
fn record(id: &str, code: &str) -> String {
    let mut line = format!("{id:0<100}");
    line.push_str(code);
    format!("{line:<130}")
}

fn write_input(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.iter().map(|l| format!("{l}\n")).collect::<String>()).unwrap();
    path
}

/// Command isolated from the developer's own config files
fn icpsr_filter(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("icpsr-filter").unwrap();
    cmd.current_dir(home).env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ICPSR"));
}

#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("icpsr-filter"));
}

#[test]
fn test_invalid_subcommand() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_filter_writes_positional_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let a = write_input(
        temp_dir.path(),
        "a.txt",
        &[record("1", "TX"), record("2", "OK"), record("3", "TX")],
    );
    let b = write_input(temp_dir.path(), "b.txt", &[record("4", "OK")]);

    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "TX", "--output-dir"])
        .arg(&out_dir)
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("TX-1.txt").and(predicate::str::contains("TX-2.txt")));

    assert_eq!(
        fs::read_to_string(out_dir.join("TX-1.txt")).unwrap(),
        format!("{}\n{}\n", record("1", "TX"), record("3", "TX"))
    );
    assert_eq!(fs::read_to_string(out_dir.join("TX-2.txt")).unwrap(), "");
}

#[test]
fn test_json_report_maps_every_input() {
    let temp_dir = TempDir::new().unwrap();
    let inputs: Vec<PathBuf> = (0..5)
        .map(|i| write_input(temp_dir.path(), &format!("in{i}.txt"), &[record(&i.to_string(), "CA")]))
        .collect();

    let assert = icpsr_filter(temp_dir.path())
        .args(["filter", "-s", "CA", "-o", ".", "--mode", "parallel", "--format", "json"])
        .args(&inputs)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let mapping = report["mapping"].as_object().unwrap();
    assert_eq!(mapping.len(), 5);
    for (i, input) in inputs.iter().enumerate() {
        let output = mapping[input.to_str().unwrap()].as_str().unwrap();
        assert!(output.ends_with(&format!("CA-{}.txt", i + 1)), "{output}");
    }
    assert_eq!(report["lines_selected"], 5);
    assert_eq!(report["files"][0]["status"], "filtered");
}

#[test]
fn test_missing_output_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), "in.txt", &[record("1", "CA")]);

    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "CA", "--output-dir", "nowhere"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("output directory"));

    assert!(!temp_dir.path().join("nowhere").exists());
}

#[test]
fn test_unreadable_input_fails_but_other_files_are_filtered() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_input(temp_dir.path(), "good.txt", &[record("1", "CA")]);

    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "CA", "--output-dir", ".", "missing.txt"])
        .arg(&good)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));

    assert!(!temp_dir.path().join("CA-1.txt").exists());
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("CA-2.txt")).unwrap(),
        format!("{}\n", record("1", "CA"))
    );
}

#[test]
fn test_allow_unreadable_writes_empty_output() {
    let temp_dir = TempDir::new().unwrap();

    icpsr_filter(temp_dir.path())
        .args([
            "filter",
            "--code",
            "CA",
            "--output-dir",
            ".",
            "--allow-unreadable",
            "missing.txt",
        ])
        .assert()
        .success();

    assert_eq!(fs::metadata(temp_dir.path().join("CA-1.txt")).unwrap().len(), 0);
}

#[test]
fn test_field_position_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        temp_dir.path(),
        "short.txt",
        &["WVrest".to_string(), "OHrest".to_string()],
    );

    icpsr_filter(temp_dir.path())
        .env("ICPSR_FILTER_FIELD__POSITION", "0")
        .args(["filter", "-q", "--code", "WV", "--output-dir", "."])
        .arg(&input)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("WV-1.txt")).unwrap(),
        "WVrest\n"
    );
}

#[test]
fn test_config_file_sets_field() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("filter.toml");
    fs::write(&config, "[field]\nposition = 3\nlength = 3\n").unwrap();
    let input = write_input(
        temp_dir.path(),
        "in.txt",
        &["abcXYZ".to_string(), "abcXY".to_string()],
    );

    icpsr_filter(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .args(["filter", "--code", "XYZ", "--output-dir", "."])
        .arg(&input)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("XYZ-1.txt")).unwrap(),
        "abcXYZ\n"
    );
}

#[test]
fn test_config_show_json() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("min_files_for_parallel"));
}

#[test]
fn test_config_validate_rejects_zero_length() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("bad.toml");
    fs::write(&config, "[field]\nlength = 0\n").unwrap();

    icpsr_filter(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("field.length"));
}

#[test]
fn test_rerun_with_missing_input_removes_old_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), "in.txt", &[record("1", "CA")]);

    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "CA", "--output-dir", "."])
        .arg(&input)
        .assert()
        .success();
    assert!(temp_dir.path().join("CA-1.txt").exists());

    fs::remove_file(&input).unwrap();
    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "CA", "--output-dir", "."])
        .arg(&input)
        .assert()
        .failure();

    assert!(!temp_dir.path().join("CA-1.txt").exists());
}

#[test]
fn test_failure_summary_goes_to_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_input(temp_dir.path(), "good.txt", &[record("1", "CA")]);

    icpsr_filter(temp_dir.path())
        .args(["filter", "--code", "CA", "--output-dir", ".", "missing.txt"])
        .arg(&good)
        .assert()
        .failure()
        .stdout(predicate::str::contains("CA-2.txt").and(predicate::str::contains("file(s) failed").not()))
        .stderr(predicate::str::contains("1 of 2 file(s) failed"));
}

#[test]
fn test_config_show_single_section() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .args(["config", "show", "field", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"position\": 100").and(predicate::str::contains("parallel").not()));

    icpsr_filter(temp_dir.path())
        .args(["config", "show", "parallel.mode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto"));
}

#[test]
fn test_config_show_unknown_section_fails() {
    let temp_dir = TempDir::new().unwrap();
    icpsr_filter(temp_dir.path())
        .args(["config", "show", "nosuch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nosuch"));
}
