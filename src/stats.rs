//! # Statistics Estimator Module
//!
//! Estimates global data range and a robust per-channel spacing unit from a
//! bounded prefix of the base tier, for consumers that stack channels on a
//! shared axis. Computed lazily, once per client, never recomputed.
//!
//! ## Algorithm
//! 1. Read `min(10000, ceil(0.1 × n_samples))` base-tier samples across all
//!    channels.
//! 2. Per channel: sort the sampled values and take the `floor(0.1 n)`-th and
//!    `floor(0.9 n)`-th order statistics; the channel range is their
//!    difference (inner 80th-percentile range, robust to spikes).
//! 3. The spacing unit is the median of the per-channel ranges, halved.
//!
//! ## Degraded path
//! A failed or empty prefix read is non-fatal: the estimator falls back to
//! `|data_max − data_min| × 0.1` using the descriptor's attribute range (or
//! the 0..1 default when the writer stored none). An approximate axis scale
//! is preferable to blocking rendering, so the fallback is logged and cached
//! exactly like a computed value; callers cannot distinguish the two.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::DatasetDescriptor;
use crate::store::{ChunkedArrayStore, SliceRange};

/// Hard cap on the number of prefix samples read for estimation
const MAX_SAMPLE_ROWS: usize = 10_000;

/// Estimated global statistics of one dataset
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DataStats {
    pub data_min: f64,
    pub data_max: f64,
    /// Base spacing unit for stacked-channel layouts
    pub spacing: f64,
}

/// Estimate statistics from a bounded prefix of the base tier.
///
/// Never fails: any read problem takes the documented fallback.
pub(crate) async fn estimate(
    store: &dyn ChunkedArrayStore,
    descriptor: &DatasetDescriptor,
) -> DataStats {
    let n_channels = descriptor.n_channels;
    let sample_rows = MAX_SAMPLE_ROWS.min(descriptor.n_samples.div_ceil(10));
    if sample_rows == 0 || n_channels == 0 {
        return fallback(descriptor, "dataset has no samples or channels");
    }

    let raw = store
        .read(
            "data",
            &[
                SliceRange::new(0, sample_rows),
                SliceRange::new(0, n_channels),
            ],
        )
        .await;

    let raw = match raw {
        Some(buf) if !buf.is_empty() => buf,
        _ => return fallback(descriptor, "prefix read returned no data"),
    };

    let rows = raw.len() / n_channels;
    if rows == 0 {
        return fallback(descriptor, "prefix read returned a truncated buffer");
    }

    let mut data_min = f64::INFINITY;
    let mut data_max = f64::NEG_INFINITY;
    for &v in &raw[..rows * n_channels] {
        let v = v as f64;
        if v < data_min {
            data_min = v;
        }
        if v > data_max {
            data_max = v;
        }
    }

    let mut channel_ranges = Vec::with_capacity(n_channels);
    for ch in 0..n_channels {
        let mut values: Vec<f32> = (0..rows).map(|i| raw[i * n_channels + ch]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let p10 = values[(values.len() as f64 * 0.1) as usize];
        let p90 = values[(values.len() as f64 * 0.9) as usize];
        channel_ranges.push((p90 - p10) as f64);
    }

    channel_ranges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = channel_ranges.len() / 2;
    let median_range = if channel_ranges.len() % 2 == 0 {
        (channel_ranges[mid - 1] + channel_ranges[mid]) / 2.0
    } else {
        channel_ranges[mid]
    };

    let stats = DataStats {
        data_min,
        data_max,
        spacing: median_range / 2.0,
    };
    log::debug!(
        "Estimated stats from {} prefix rows: min={}, max={}, spacing={}",
        rows,
        stats.data_min,
        stats.data_max,
        stats.spacing
    );
    stats
}

fn fallback(descriptor: &DatasetDescriptor, reason: &str) -> DataStats {
    let (data_min, data_max) = attribute_range(descriptor);
    log::warn!(
        "Falling back to coarse spacing estimate ({}): range [{}, {}]",
        reason,
        data_min,
        data_max
    );
    DataStats {
        data_min,
        data_max,
        spacing: (data_max - data_min).abs() * 0.1,
    }
}

/// Range declared by the writer, or the 0..1 default
pub(crate) fn attribute_range(descriptor: &DatasetDescriptor) -> (f64, f64) {
    match (descriptor.data_min, descriptor.data_max) {
        (Some(min), Some(max)) => (min, max),
        _ => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttrMap, MemoryStore};
    use serde_json::json;

    fn descriptor(n_samples: usize, n_channels: usize) -> DatasetDescriptor {
        let mut attrs = AttrMap::new();
        attrs.insert("n_timepoints".to_string(), json!(n_samples));
        attrs.insert("n_channels".to_string(), json!(n_channels));
        attrs.insert("sampling_frequency_hz".to_string(), json!(1000.0));
        attrs.insert("start_time_sec".to_string(), json!(0.0));
        DatasetDescriptor::from_attrs(&attrs).unwrap()
    }

    #[tokio::test]
    async fn test_known_percentiles() {
        // Channel 0 is constant, channel 1 ramps 0, 1, 2, ... The estimator
        // reads the first ceil(0.1 * 1000) = 100 rows.
        let n = 1000;
        let mut values = Vec::with_capacity(n * 2);
        for i in 0..n {
            values.push(5.0);
            values.push(i as f32);
        }
        let mut store = MemoryStore::new(AttrMap::new());
        store.insert("data", vec![n, 2], values).unwrap();

        let stats = estimate(&store, &descriptor(n, 2)).await;

        // Sampled ramp is 0..=99: p10 = 10, p90 = 90, range 80; constant
        // channel has range 0; median of {0, 80} = 40, spacing = 20.
        assert!((stats.spacing - 20.0).abs() < 1e-9);
        assert_eq!(stats.data_min, 0.0);
        assert_eq!(stats.data_max, 99.0);
    }

    #[tokio::test]
    async fn test_odd_channel_count_median() {
        let n = 100; // prefix covers all 10 sampled rows
        let mut values = Vec::with_capacity(n * 3);
        for i in 0..n {
            values.push(0.0);
            values.push((i % 10) as f32);
            values.push((i % 10) as f32 * 10.0);
        }
        let mut store = MemoryStore::new(AttrMap::new());
        store.insert("data", vec![n, 3], values).unwrap();

        let stats = estimate(&store, &descriptor(n, 3)).await;
        // Prefix covers rows 0..10. Per-channel inner-80% ranges sort to
        // [0, 8, 80]; the median is the middle channel's range 8.
        assert!((stats.spacing - 4.0).abs() < 1e-9);
        assert_eq!(stats.data_min, 0.0);
        assert_eq!(stats.data_max, 90.0);
    }

    #[tokio::test]
    async fn test_fallback_on_missing_dataset() {
        let store = MemoryStore::new(AttrMap::new());
        let mut d = descriptor(1000, 2);
        d.data_min = Some(-2.0);
        d.data_max = Some(2.0);

        let stats = estimate(&store, &d).await;
        assert!((stats.spacing - 0.4).abs() < 1e-12);
        assert_eq!(stats.data_min, -2.0);
        assert_eq!(stats.data_max, 2.0);
    }

    #[tokio::test]
    async fn test_fallback_default_range() {
        let store = MemoryStore::new(AttrMap::new());
        let stats = estimate(&store, &descriptor(1000, 2)).await;
        assert!((stats.spacing - 0.1).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_empty_dataset_uses_fallback() {
        let store = MemoryStore::new(AttrMap::new());
        let stats = estimate(&store, &descriptor(0, 0)).await;
        assert!((stats.spacing - 0.1).abs() < 1e-12);
    }
}
