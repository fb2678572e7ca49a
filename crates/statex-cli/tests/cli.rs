//! Smoke tests for the `statex` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONTRACT_NOTE: &str = "GEOJIT FINANCIAL SERVICES LTD
CONTRACT NOTE NO : 4175211
TRADE DATE : 07.07.2020
Name Of Exchange & Segment : nse eq
EXCHANGE SEGMENT STTLNO STTLDATE UCCODE
NSE EQ 2020127 08.07.2020 -
Scrip-Summary
Security Description B/S Qty Gross Rate Gross Total Brokerage Net Rate Net Total
HDFC BANK LIMITED B 10 1000.00 10000.00 1.00 10.00 1001.00 -10010.00
Statement Of Securities
HDFC BANK LIMITED - INE040A01034
Securities Transaction Tax 13.00
Net Amount Payable 10023.00";

const RECEIPT: &str = "LIFE INSURANCE CORPORATION OF INDIA
Premium Receipt
Transaction No. : PR1234567890123
Date (Time) : 12/06/2017 (10:22:33)
Smt./Ms./Shri : JOHN DOE
Policy No 123456789
Total Amt (Rs) 12,900.53";

fn statex() -> Command {
    Command::cargo_bin("statex").unwrap()
}

/// A fresh default config file so tests never read the user's own.
fn init_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.json");
    statex()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    path
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn formats_lists_registry() {
    statex()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("geojit"))
        .stdout(predicate::str::contains("icici-dividend"))
        .stdout(predicate::str::contains("windowed"));
}

#[test]
fn extract_csv_to_stdout() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);
    let note = write(dir.path(), "note.txt", CONTRACT_NOTE);

    statex()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&note)
        .args(["--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("source,page,format"))
        .stdout(predicate::str::contains("INE040A01034"));
}

#[test]
fn extract_json_to_file() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);
    let note = write(dir.path(), "note.txt", CONTRACT_NOTE);
    let out = dir.path().join("note.json");

    statex()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&note)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s) written"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["format"], "geojit");
    assert_eq!(json["outcome"]["status"], "success");
}

#[test]
fn extract_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    statex()
        .arg("--config")
        .arg(&config)
        .args(["extract", "no-such-file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn unknown_statement_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);
    let note = write(dir.path(), "note.txt", CONTRACT_NOTE);

    statex()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&note)
        .args(["--statement", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown statement format"));
}

#[test]
fn batch_writes_kind_files_and_summary() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    write(&input, "note.txt", CONTRACT_NOTE);
    write(&input, "receipt.txt", RECEIPT);
    write(&input, "broken.pdf", "%PDF-1.4 not really");
    let out = dir.path().join("out");

    statex()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*", input.display()))
        .arg("-o")
        .arg(&out)
        .args(["-j", "2", "--summary", "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 files"));

    let trades = fs::read_to_string(out.join("trade.csv")).unwrap();
    assert!(trades.contains("INE040A01034"));
    assert!(out.join("premium.csv").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<_> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("source,format,outcome,records"));
    assert!(lines.iter().any(|l| l.starts_with("broken.pdf,,empty,0")));
}

#[test]
fn batch_stops_on_unreadable_without_continue() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);
    statex()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "batch.continue_on_error", "false"])
        .assert()
        .success();

    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    write(&input, "broken.pdf", "%PDF-1.4 not really");

    statex()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*.pdf", input.display()))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn config_get_and_set_use_given_file() {
    let dir = TempDir::new().unwrap();
    let config = init_config(&dir);

    statex()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.backtrack_window", "500"])
        .assert()
        .success();

    statex()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.backtrack_window"])
        .assert()
        .success()
        .stdout(predicate::str::contains("500"));

    statex()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}
