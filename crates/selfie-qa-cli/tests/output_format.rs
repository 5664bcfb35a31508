//! Output format validation tests.
//!
//! Tests JSON/JSONL output format correctness and required field presence.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use selfie_qa_test_support::SyntheticFrameBuilder;
use serde_json::Value;

const REQUIRED_FIELDS: &[&str] = &[
    "path",
    "gate",
    "brightness",
    "contrast",
    "sharpness",
    "face_detected",
    "face_confidence",
    "face_size",
    "bounding_box",
    "head_pose",
    "eyes_open",
    "overall_score",
    "issues",
    "recommendations",
    "breakdown",
];

fn images() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    SyntheticFrameBuilder::save_face(240, 240, &dir.path().join("a_face.png")).unwrap();
    SyntheticFrameBuilder::save_dark(240, 240, &dir.path().join("b_dark.png")).unwrap();
    dir
}

fn run(dir: &tempfile::TempDir, args: &[&str]) -> String {
    let output = Command::cargo_bin("selfie-qa")
        .unwrap()
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .args(args)
        .output()
        .unwrap();
    String::from_utf8(output.stdout).unwrap()
}

// === JSONL Format Tests ===

#[test]
fn test_jsonl_format_single_object_per_line() {
    let dir = images();
    let stdout = run(&dir, &["--format", "jsonl", "--fixed-attributes", "."]);

    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let parsed: Value = serde_json::from_str(line).unwrap();
        assert!(parsed.is_object(), "each line should be an object: {line}");
    }
}

#[test]
fn test_jsonl_is_default() {
    let dir = images();
    let stdout = run(&dir, &["--fixed-attributes", "."]);
    assert_eq!(stdout.lines().count(), 2);
    assert!(!stdout.trim_start().starts_with('['));
}

#[test]
fn test_required_fields_present() {
    let dir = images();
    let stdout = run(&dir, &["--fixed-attributes", "."]);

    for line in stdout.lines() {
        let record: Value = serde_json::from_str(line).unwrap();
        for field in REQUIRED_FIELDS {
            assert!(record.get(field).is_some(), "missing {field} in {line}");
        }
        assert!(record.get("tick").is_none(), "check records carry no tick");
    }
}

#[test]
fn test_issues_and_recommendations_are_parallel() {
    let dir = images();
    let stdout = run(&dir, &["--fixed-attributes", "."]);

    for line in stdout.lines() {
        let record: Value = serde_json::from_str(line).unwrap();
        assert_eq!(
            record["issues"].as_array().unwrap().len(),
            record["recommendations"].as_array().unwrap().len()
        );
    }
}

#[test]
fn test_breakdown_sums_to_overall_score() {
    let dir = images();
    let stdout = run(&dir, &["--fixed-attributes", "."]);

    for line in stdout.lines() {
        let record: Value = serde_json::from_str(line).unwrap();
        let breakdown = record["breakdown"].as_array().unwrap();
        assert_eq!(breakdown.len(), 7);
        let sum: u64 = breakdown
            .iter()
            .map(|award| award["points"].as_u64().unwrap())
            .sum();
        assert_eq!(sum, record["overall_score"].as_u64().unwrap());
    }
}

#[test]
fn test_scores_in_range() {
    let dir = images();
    let stdout = run(&dir, &["--seed", "3", "."]);

    for line in stdout.lines() {
        let record: Value = serde_json::from_str(line).unwrap();
        assert!(record["overall_score"].as_u64().unwrap() <= 100);
        for field in ["brightness", "contrast", "sharpness"] {
            let value = record[field].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&value), "{field} = {value}");
        }
        let confidence = record["face_confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }
}

// === JSON Array Tests ===

#[test]
fn test_json_format_is_array() {
    let dir = images();
    let stdout = run(&dir, &["--format", "json", "--fixed-attributes", "."]);

    let value: Value = serde_json::from_str(&stdout).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0]["path"].as_str().unwrap().ends_with("a_face.png"));
    assert!(records[1]["path"].as_str().unwrap().ends_with("b_dark.png"));
}

#[test]
fn test_json_compact_by_default() {
    let dir = images();
    let stdout = run(&dir, &["--format", "json", "--fixed-attributes", "."]);
    assert_eq!(stdout.trim_end().lines().count(), 1);
}

#[test]
fn test_json_pretty() {
    let dir = images();
    let stdout = run(
        &dir,
        &["--format", "json", "--pretty", "--fixed-attributes", "."],
    );
    assert!(stdout.lines().count() > 1);
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert!(value.is_array());
}

#[test]
fn test_json_empty_input_is_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run(&dir, &["--format", "json", "."]);
    assert_eq!(stdout.trim(), "[]");
}
