//! Tests for the sheet lock retry logic
//!
//! Run with: cargo test --test connection_retry_test -- --nocapture

use std::fs::OpenOptions;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tempfile::TempDir;

use caixinha_core::adapters::CsvRecordStore;
use caixinha_core::domain::RecordRow;

fn row(id: &str) -> RecordRow {
    RecordRow {
        id: id.to_string(),
        kind: "income".to_string(),
        amount: "10.00".to_string(),
        ..Default::default()
    }
}

/// An append waits for a short-lived lock held by another writer
#[test]
fn test_append_retries_until_lock_is_released() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lancamentos.csv");

    let holder = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap();
    holder.lock_exclusive().unwrap();

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        let start = Instant::now();
        let result = CsvRecordStore::new(writer_path).append_row(&row("a"));
        println!("append finished after {:?}", start.elapsed());
        result
    });

    thread::sleep(Duration::from_millis(120));
    holder.unlock().unwrap();

    writer.join().unwrap().unwrap();
    let rows = CsvRecordStore::new(&path).read_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "a");
}

/// A lock that is never released ends in a persistence error, not a hang
#[test]
fn test_append_gives_up_on_a_held_lock() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lancamentos.csv");

    let holder = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap();
    holder.lock_exclusive().unwrap();

    let start = Instant::now();
    let err = CsvRecordStore::new(&path).append_row(&row("b")).unwrap_err();
    assert!(err.is_persistence());
    assert!(start.elapsed() < Duration::from_secs(5));

    holder.unlock().unwrap();
    assert!(CsvRecordStore::new(&path).read_rows().unwrap().is_empty());
}
