//! Sliding-Window Feature Aggregation
//!
//! Reduces one unit's chronologically sorted readings to overlapping
//! fixed-length windows of summary statistics. Per channel: mean, population
//! standard deviation (divisor N, since these are complete populations of a
//! window, not samples), min, max. A `failure_count` feature sums the
//! failure flag over the window.
//!
//! Windows start at offsets `0, stride, 2*stride, ...` and only full windows
//! are emitted; a partial trailing window would carry biased statistics, so
//! it is excluded rather than padded.

use crate::types::{FeatureWindow, SensorReading};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Errors in window aggregation.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("invalid parameter {name}: {value} (must be a positive integer)")]
    InvalidParameter { name: &'static str, value: usize },
}

/// Compute sliding feature windows over one unit's ordered readings.
///
/// Returns an empty vector when fewer than `window_size` readings exist;
/// that is a valid result, not an error. `window_size` and `stride` must be
/// positive.
///
/// Feature values are a pure function of the readings, and `window_id` is a
/// pure function of `(unit_id, offsets)`, so repeated runs over identical
/// input are bit-for-bit identical.
pub fn compute_windows(
    readings: &[SensorReading],
    unit_id: &str,
    window_size: usize,
    stride: usize,
) -> Result<Vec<FeatureWindow>, WindowError> {
    if window_size == 0 {
        return Err(WindowError::InvalidParameter {
            name: "window_size",
            value: window_size,
        });
    }
    if stride == 0 {
        return Err(WindowError::InvalidParameter {
            name: "stride",
            value: stride,
        });
    }

    let n = readings.len();
    if window_size > n {
        debug!(unit_id, n, window_size, "Fewer readings than one window; no windows emitted");
        return Ok(Vec::new());
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    while start + window_size <= n {
        let end = start + window_size;
        let view = &readings[start..end];
        windows.push(aggregate_window(view, unit_id, start, end));
        start += stride;
    }

    debug!(unit_id, count = windows.len(), window_size, stride, "Computed feature windows");
    Ok(windows)
}

/// Aggregate one full window of readings into a `FeatureWindow`.
fn aggregate_window(
    view: &[SensorReading],
    unit_id: &str,
    start: usize,
    end: usize,
) -> FeatureWindow {
    // Union of channel names across the window; readings may omit channels.
    let channel_names: BTreeSet<&str> = view
        .iter()
        .flat_map(|r| r.channels.keys().map(String::as_str))
        .collect();

    let mut features: BTreeMap<String, Option<f64>> = BTreeMap::new();

    for name in channel_names {
        let values: Vec<f64> = view.iter().filter_map(|r| r.channels.get(name).copied()).collect();
        let (mean, std, min, max) = if values.is_empty() {
            // Unreachable given the union above, but a channel with no
            // samples in view must yield nulls rather than NaN.
            (None, None, None, None)
        } else {
            (
                Some((&values).mean()),
                Some((&values).population_std_dev()),
                Some(Statistics::min(&values)),
                Some(Statistics::max(&values)),
            )
        };
        features.insert(format!("{name}_mean"), mean);
        features.insert(format!("{name}_std"), std);
        features.insert(format!("{name}_min"), min);
        features.insert(format!("{name}_max"), max);
    }

    let failure_count = view.iter().filter(|r| r.failure).count();
    features.insert("failure_count".to_string(), Some(failure_count as f64));

    FeatureWindow {
        unit_id: unit_id.to_string(),
        window_id: format!("{unit_id}__{start}__{end}"),
        start_time: view[0].time,
        end_time: view[view.len() - 1].time,
        features,
    }
}
