use std::fs;

use chrono::NaiveDate;
use opal_core::{NewsRecord, ResultSet};
use opal_engine::{ensure_output_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("out.json", "[]").unwrap();
    assert_eq!(first.file_name().unwrap(), "out.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "[]");

    let second = writer.write("out.json", "[1]").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "[1]");
    // Only the target remains; temp files were renamed away.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("out.json", "[]").is_err());
    assert!(!file_path.with_file_name("out.json").exists());
}

#[test]
fn result_set_is_written_under_dated_name() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());
    let mut records = ResultSet::new();
    records.push(NewsRecord::new("https://a.example/1", "T", "A", "D", vec!["x".into()]).into());
    let date = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();

    let path = writer.write_result_set(&records, date, "Parser1819").unwrap();

    assert_eq!(path, temp.path().join("2025-06-11_Parser1819.json"));
    let restored = ResultSet::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored, records);
}
