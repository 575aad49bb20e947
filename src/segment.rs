//! # Segment Reconstruction Module
//!
//! Reshapes the flat buffers returned by the store into per-channel arrays.
//!
//! ## Buffer layouts
//! - Base tier: row-major `[time][channel]`; channel `c` sample `i` lives at
//!   `i * n_channels + c`.
//! - Downsampled tiers: row-major `[time][min|max][channel]` with the minimum
//!   row first; channel `c` point `i` has its minimum at
//!   `i * 2 * n_channels + c` and its maximum at
//!   `i * 2 * n_channels + n_channels + c`.
//!
//! Output arrays are always exactly `length` (base) or `2 × length`
//! (downsampled, interleaved min/max) values long. Buffers padded past the
//! requested range by chunk-aligned stores are truncated; buffers that come
//! up short fail with `ShapeMismatch`.

use serde::Serialize;

use crate::error::LoadError;

/// One reconstructed run of visible samples, owned by the caller.
///
/// `data` holds one array per channel. For downsampled segments each array
/// interleaves (min, max) pairs, so its length is `2 × length`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSegment {
    pub data: Vec<Vec<f32>>,
    pub is_downsampled: bool,
    pub downsample_factor: u32,
    pub start_time_sec: f64,
    pub sampling_frequency: f64,
    pub length: usize,
}

impl LoadedSegment {
    /// Zero-length segment for a visible window that misses the dataset
    /// entirely. Carries the tier metadata so callers see a uniform shape.
    pub(crate) fn empty(
        n_channels: usize,
        factor: u32,
        start_time_sec: f64,
        sampling_frequency: f64,
    ) -> Self {
        Self {
            data: vec![Vec::new(); n_channels],
            is_downsampled: factor > 1,
            downsample_factor: factor,
            start_time_sec,
            sampling_frequency,
            length: 0,
        }
    }
}

/// Split a base-tier buffer into one array of `length` values per channel
pub(crate) fn split_channels(
    raw: &[f32],
    length: usize,
    n_channels: usize,
    dataset: &str,
) -> Result<Vec<Vec<f32>>, LoadError> {
    let expected = length * n_channels;
    if raw.len() < expected {
        return Err(LoadError::ShapeMismatch {
            dataset: dataset.to_string(),
            expected,
            actual: raw.len(),
        });
    }

    let mut channels = Vec::with_capacity(n_channels);
    for ch in 0..n_channels {
        let mut values = Vec::with_capacity(length);
        for i in 0..length {
            values.push(raw[i * n_channels + ch]);
        }
        channels.push(values);
    }
    Ok(channels)
}

/// Split a downsampled-tier buffer into one interleaved (min, max) array of
/// `2 × length` values per channel
pub(crate) fn split_channels_min_max(
    raw: &[f32],
    length: usize,
    n_channels: usize,
    dataset: &str,
) -> Result<Vec<Vec<f32>>, LoadError> {
    let expected = length * 2 * n_channels;
    if raw.len() < expected {
        return Err(LoadError::ShapeMismatch {
            dataset: dataset.to_string(),
            expected,
            actual: raw.len(),
        });
    }

    let mut channels = Vec::with_capacity(n_channels);
    for ch in 0..n_channels {
        let mut values = Vec::with_capacity(length * 2);
        for i in 0..length {
            let row = i * 2 * n_channels;
            values.push(raw[row + ch]);
            values.push(raw[row + n_channels + ch]);
        }
        channels.push(values);
    }
    Ok(channels)
}
