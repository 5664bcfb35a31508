//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use predicates::prelude::*;
use selfie_qa_test_support::SyntheticFrameBuilder;

/// Command isolated from any user or project config.
fn selfie_qa(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("selfie-qa").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path());
    cmd
}

fn face_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    SyntheticFrameBuilder::save_face(240, 240, &dir.path().join("face.png")).unwrap();
    dir
}

// === Missing/Invalid Path Tests ===

#[test]
fn test_missing_path_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    selfie_qa(&dir).assert().code(2).stderr(
        predicate::str::contains("No paths specified")
            .or(predicate::str::contains("required"))
            .or(predicate::str::contains("PATHS")),
    );
}

#[test]
fn test_nonexistent_path_warns_but_continues() {
    let dir = tempfile::tempdir().unwrap();
    selfie_qa(&dir)
        .arg("/nonexistent/path/to/image.jpg")
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    selfie_qa(&dir).arg(dir.path()).assert().code(0);
}

#[test]
fn test_unsupported_extension_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    selfie_qa(&dir)
        .arg(&notes)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Unsupported file type"));
}

// === Value Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["--format", "xml", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'xml'"));
}

#[test]
fn test_threshold_above_100_rejected() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["--threshold", "101", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("101 is not in 0..=100"));
}

#[test]
fn test_threshold_not_a_number_rejected() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["--threshold", "high", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'high' is not a valid score"));
}

#[test]
fn test_unknown_provider_rejected() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["--provider", "neural", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'neural'"));
}

// === Subcommand Tests ===

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    selfie_qa(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check").and(predicate::str::contains("live")));
}

#[test]
fn test_check_subcommand_matches_default() {
    let dir = face_dir();
    let default = selfie_qa(&dir)
        .args(["--fixed-attributes", "face.png"])
        .output()
        .unwrap();
    let explicit = selfie_qa(&dir)
        .args(["check", "--fixed-attributes", "face.png"])
        .output()
        .unwrap();
    assert_eq!(default.status.code(), explicit.status.code());
    assert_eq!(default.stdout, explicit.stdout);
}

#[test]
fn test_live_requires_paths() {
    let dir = tempfile::tempdir().unwrap();
    selfie_qa(&dir)
        .arg("live")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_live_rejects_zero_ticks() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["live", "--ticks", "0", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ticks"));
}

#[test]
fn test_live_rejects_zero_cadence() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["live", "--cadence-ms", "0", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--cadence-ms"));
}

#[test]
fn test_live_rejects_non_positive_duration() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["live", "--duration", "0", "face.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a positive duration"));
}

#[test]
fn test_verbose_flag_is_global() {
    let dir = face_dir();
    selfie_qa(&dir)
        .args(["check", "-vv", "--fixed-attributes", "face.png"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("DEBUG"));
}
