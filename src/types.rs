//! Core data types shared across the knowledge pipeline
//!
//! Centralizes the records that flow between components:
//! - `SensorReading`: one row of the sensor table for a single unit
//! - `FeatureWindow`: aggregated statistics over a slice of readings
//! - `SpecSection`: one failure-mode section of the specification document
//! - `SearchResult`: a scored hit from the embeddings store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timestamped sensor row for a single equipment unit.
///
/// Channel names come from the CSV header (`sensor_1`, `sensor_2`, ...).
/// `BTreeMap` keeps channel iteration order stable so downstream feature
/// maps are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Equipment unit identifier (e.g. "unit_1")
    pub unit_id: String,
    /// Reading timestamp (UTC)
    pub time: DateTime<Utc>,
    /// Numeric channel values keyed by channel name
    pub channels: BTreeMap<String, f64>,
    /// Failure event flag for this timestep
    pub failure: bool,
}

/// Aggregated feature statistics over one sliding window of readings.
///
/// `window_id` is a pure function of `(unit_id, start_offset, end_offset)`,
/// so re-running aggregation over the same input produces the same ids and
/// a downstream store that merges by id stays idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWindow {
    /// Equipment unit this window belongs to
    pub unit_id: String,
    /// Deterministic identifier: `{unit_id}__{start_offset}__{end_offset}`
    pub window_id: String,
    /// Timestamp of the first reading in the window
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last reading in the window (inclusive)
    pub end_time: DateTime<Utc>,
    /// Feature name -> value; `None` when a channel had no samples in view
    pub features: BTreeMap<String, Option<f64>>,
}

/// One labeled section of the equipment specification document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSection {
    /// Section label, e.g. "FM-01"
    pub id: String,
    /// Heading title, e.g. "Progressive Turbine Imbalance"
    pub title: String,
    /// Verbatim section body (heading line included), trimmed
    pub text: String,
}

/// A scored similarity hit returned by the embeddings store.
///
/// `metadata` is a copy; callers never hold references into store
/// internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Cosine similarity in [-1, 1]
    pub score: f32,
    /// Caller-supplied metadata for the matched vector
    pub metadata: serde_json::Value,
}
