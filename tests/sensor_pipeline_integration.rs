//! Sensor Pipeline Integration Test
//!
//! CSV -> per-unit reading table -> sliding feature windows -> graph sink
//! upsert, twice, verifying the window_id contract makes re-ingestion
//! idempotent.

use engine_kb::ingest::{ingest_windows, read_sensor_csv, GraphSink, InMemoryGraphSink};
use std::fmt::Write as _;
use std::io::Write as _;

/// Build a CSV with `n` rows per unit at 1-minute intervals.
fn synthetic_csv(units: &[&str], n: usize) -> String {
    let mut csv = String::from("unit_id,time,sensor_1,sensor_2,failure\n");
    for unit in units {
        for i in 0..n {
            let _ = writeln!(
                csv,
                "{unit},2024-03-01 00:{:02}:00,{:.1},{:.1},{}",
                i,
                i as f64 * 0.5,
                100.0 - i as f64,
                u8::from(i == n - 1)
            );
        }
    }
    csv
}

#[test]
fn csv_to_windows_to_sink() {
    let csv = synthetic_csv(&["unit_1", "unit_2"], 23);
    let mut file = tempfile::NamedTempFile::new().expect("temp csv");
    file.write_all(csv.as_bytes()).expect("write csv");

    let table = read_sensor_csv(file.path()).expect("read csv");
    assert_eq!(table.unit_ids(), vec!["unit_1", "unit_2"]);
    assert_eq!(table.row_count(), 46);

    // 23 readings, size 10, stride 5 -> 3 full windows per unit.
    let windows = table.window_all(10, 5).expect("window");
    assert_eq!(windows.len(), 6);
    assert_eq!(windows[0].window_id, "unit_1__0__10");
    assert_eq!(windows[3].window_id, "unit_2__0__10");

    // Window statistics come from the right slice: sensor_1 = 0.5 * index.
    let w = &windows[1]; // unit_1, offsets (5, 15)
    assert_eq!(w.features["sensor_1_min"], Some(2.5));
    assert_eq!(w.features["sensor_1_max"], Some(7.0));
    assert_eq!(w.features["failure_count"], Some(0.0));

    let sink = InMemoryGraphSink::new();
    let inserted = ingest_windows(&table, &sink, 10, 5, 500).expect("ingest");
    assert_eq!(inserted, 6);
    assert_eq!(sink.window_count(), 6);

    // Second pass over identical data inserts nothing.
    let inserted_again = ingest_windows(&table, &sink, 10, 5, 500).expect("re-ingest");
    assert_eq!(inserted_again, 0);
    assert_eq!(sink.window_count(), 6);

    // Stored windows are retrievable by their deterministic id.
    let stored = sink.get("unit_2__5__15").expect("stored window");
    assert_eq!(stored.unit_id, "unit_2");
    assert_eq!(stored.features["sensor_2_max"], Some(95.0));
}
