//! Sensor CSV Ingestion
//!
//! Reads the tabular sensor/failure export into per-unit reading sequences
//! and hands feature windows to a graph sink in batches. The CSV contract:
//! a header with `unit_id`, `time` and `failure` columns; every other
//! numeric column is treated as a sensor channel named by its header.
//!
//! The graph store itself is an external collaborator; `GraphSink`
//! abstracts the batched upsert so the pipeline can run against an
//! in-memory sink in tests or a real graph driver in production. Upserts
//! merge by `window_id`, so re-ingesting the same data is idempotent.

use crate::types::{FeatureWindow, SensorReading};
use crate::windows::{compute_windows, WindowError};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::{info, warn};

/// Errors in sensor table ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("CSV has no header row")]
    EmptyFile,

    #[error("line {line}: cannot parse timestamp {value:?}")]
    BadTimestamp { line: usize, value: String },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("graph sink error: {0}")]
    Sink(String),
}

/// Sensor readings grouped per unit, each unit sorted by time.
#[derive(Debug, Default)]
pub struct SensorTable {
    units: BTreeMap<String, Vec<SensorReading>>,
}

impl SensorTable {
    /// Unit ids present in the table, sorted.
    pub fn unit_ids(&self) -> Vec<&str> {
        self.units.keys().map(String::as_str).collect()
    }

    /// Readings for one unit, chronologically sorted.
    pub fn readings(&self, unit_id: &str) -> Option<&[SensorReading]> {
        self.units.get(unit_id).map(Vec::as_slice)
    }

    /// Total row count across all units.
    pub fn row_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    /// Compute feature windows for every unit, concatenated in unit order.
    pub fn window_all(
        &self,
        window_size: usize,
        stride: usize,
    ) -> Result<Vec<FeatureWindow>, WindowError> {
        let mut windows = Vec::new();
        for (unit_id, readings) in &self.units {
            windows.extend(compute_windows(readings, unit_id, window_size, stride)?);
        }
        Ok(windows)
    }
}

/// Split a CSV line respecting quoted fields (commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse a timestamp as RFC 3339 or naive `YYYY-MM-DD HH:MM:SS` (assumed UTC).
fn parse_time(value: &str, line: usize) -> Result<DateTime<Utc>, IngestError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(IngestError::BadTimestamp {
        line,
        value: value.to_string(),
    })
}

/// Read a sensor CSV into per-unit, time-sorted reading sequences.
///
/// Rows with an unparseable channel value keep their other channels (the
/// bad cell is skipped with a warning); an unparseable timestamp fails the
/// load since ordering depends on it.
pub fn read_sensor_csv<P: AsRef<Path>>(path: P) -> Result<SensorTable, IngestError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut lines = content.lines().enumerate();

    let (_, header) = lines.next().ok_or(IngestError::EmptyFile)?;
    let columns = csv_split(header);

    let mut unit_col = None;
    let mut time_col = None;
    let mut failure_col = None;
    let mut channel_cols: Vec<(usize, String)> = Vec::new();

    for (idx, name) in columns.iter().enumerate() {
        match name.trim() {
            "unit_id" => unit_col = Some(idx),
            "time" => time_col = Some(idx),
            "failure" => failure_col = Some(idx),
            other if !other.is_empty() => channel_cols.push((idx, other.to_string())),
            _ => {}
        }
    }

    let (unit_col, time_col, failure_col) = match (unit_col, time_col, failure_col) {
        (Some(u), Some(t), Some(f)) => (u, t, f),
        _ => {
            let missing = [("unit_id", unit_col), ("time", time_col), ("failure", failure_col)]
                .iter()
                .filter(|(_, col)| col.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(IngestError::MissingColumns(missing));
        }
    };

    let mut table = SensorTable::default();
    for (line_idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv_split(line);
        let line_no = line_idx + 1;

        let unit_id = fields.get(unit_col).map(|s| s.trim()).unwrap_or_default();
        if unit_id.is_empty() {
            warn!(line = line_no, "Skipping row without unit_id");
            continue;
        }

        let time_raw = fields.get(time_col).map(|s| s.trim()).unwrap_or_default();
        let time = parse_time(time_raw, line_no)?;

        let failure = fields
            .get(failure_col)
            .map(|s| matches!(s.trim(), "1" | "true" | "True"))
            .unwrap_or(false);

        let mut channels = BTreeMap::new();
        for (idx, name) in &channel_cols {
            let Some(raw) = fields.get(*idx) else { continue };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    channels.insert(name.clone(), v);
                }
                Ok(_) => {
                    warn!(line = line_no, channel = %name, "Skipping non-finite channel value");
                }
                Err(_) => {
                    warn!(line = line_no, channel = %name, value = raw, "Skipping unparseable channel value");
                }
            }
        }

        table.units.entry(unit_id.to_string()).or_default().push(SensorReading {
            unit_id: unit_id.to_string(),
            time,
            channels,
            failure,
        });
    }

    for readings in table.units.values_mut() {
        readings.sort_by_key(|r| r.time);
    }

    info!(
        units = table.units.len(),
        rows = table.row_count(),
        "Loaded sensor CSV"
    );
    Ok(table)
}

/// Batched upsert target for feature windows.
///
/// Implementations merge by `window_id`: upserting the same window twice
/// must leave exactly one entry. A failed batch fails as a whole; there is
/// no partial-batch retry logic at this layer.
pub trait GraphSink: Send + Sync {
    /// Upsert a batch of windows; returns how many were newly inserted.
    fn upsert_windows(&self, windows: &[FeatureWindow]) -> Result<usize, IngestError>;

    /// Total windows currently held by the sink.
    fn window_count(&self) -> usize;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// In-memory sink for tests and minimal deployments.
///
/// Thread-safe via `RwLock`. Not durable; contents lost on restart.
#[derive(Default)]
pub struct InMemoryGraphSink {
    windows: RwLock<BTreeMap<String, FeatureWindow>>,
}

impl InMemoryGraphSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored window by id (test/introspection helper).
    pub fn get(&self, window_id: &str) -> Option<FeatureWindow> {
        self.windows
            .read()
            .ok()
            .and_then(|map| map.get(window_id).cloned())
    }
}

impl GraphSink for InMemoryGraphSink {
    fn upsert_windows(&self, windows: &[FeatureWindow]) -> Result<usize, IngestError> {
        let mut map = self
            .windows
            .write()
            .map_err(|e| IngestError::Sink(e.to_string()))?;

        let mut inserted = 0;
        for window in windows {
            if map.insert(window.window_id.clone(), window.clone()).is_none() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn window_count(&self) -> usize {
        self.windows.read().map(|map| map.len()).unwrap_or(0)
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

/// Run the full batch: windows per unit, upserted in fixed-size batches.
pub fn ingest_windows(
    table: &SensorTable,
    sink: &dyn GraphSink,
    window_size: usize,
    stride: usize,
    batch_size: usize,
) -> Result<usize, IngestError> {
    let windows = table.window_all(window_size, stride)?;

    let mut inserted = 0;
    for batch in windows.chunks(batch_size.max(1)) {
        inserted += sink.upsert_windows(batch)?;
    }

    info!(
        windows = windows.len(),
        inserted,
        backend = sink.backend_name(),
        "Ingested feature windows"
    );
    Ok(inserted)
}
