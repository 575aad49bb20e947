//! # Resolution Catalog Module
//!
//! Parses a dataset group's attribute map into an immutable, validated
//! descriptor: base sample count, channel count, sampling rate, start time and
//! the list of downsample tiers materialized in storage. All later arithmetic
//! (tier selection, index clamping, reconstruction) runs against this struct,
//! never against the loose attribute bag, so malformed metadata fails here and
//! nowhere else.
//!
//! ## Tier naming
//! Each downsample factor `f > 1` corresponds to a sibling dataset named
//! `data_ds_<f>` holding `ceil(n_samples / f)` summarized points; factor 1 is
//! the base `data` dataset and is always implied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;
use crate::store::AttrMap;

/// Immutable description of one tiered dataset, created at client construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub n_channels: usize,
    pub n_samples: usize,
    pub start_time_sec: f64,
    pub sampling_frequency_hz: f64,
    /// Channel labels; empty when the writer recorded none
    pub channel_ids: Vec<String>,
    /// Available downsample tiers, sorted ascending, all > 1
    pub downsample_factors: Vec<u32>,
    /// Precomputed global range, when the writer stored one
    pub data_min: Option<f64>,
    pub data_max: Option<f64>,
}

impl DatasetDescriptor {
    /// Parse and validate the group attribute map.
    ///
    /// Required: `n_timepoints`, `n_channels`, `sampling_frequency_hz`,
    /// `start_time_sec`. Optional: `channel_ids`, `downsample_factors`,
    /// `data_min`, `data_max`. Any absent required attribute or malformed
    /// value fails construction; there is no partial descriptor.
    pub fn from_attrs(attrs: &AttrMap) -> Result<Self, CatalogError> {
        let n_samples = attr_usize(attrs, "n_timepoints")?;
        let n_channels = attr_usize(attrs, "n_channels")?;
        let sampling_frequency_hz = attr_f64(attrs, "sampling_frequency_hz")?;
        let start_time_sec = attr_f64(attrs, "start_time_sec")?;

        if !(sampling_frequency_hz > 0.0) || !sampling_frequency_hz.is_finite() {
            return Err(CatalogError::MalformedAttribute {
                name: "sampling_frequency_hz".to_string(),
                reason: format!("must be a positive number, got {}", sampling_frequency_hz),
            });
        }
        if !start_time_sec.is_finite() {
            return Err(CatalogError::MalformedAttribute {
                name: "start_time_sec".to_string(),
                reason: "must be finite".to_string(),
            });
        }

        let mut downsample_factors = opt_factor_list(attrs, "downsample_factors")?;
        downsample_factors.sort_unstable();
        downsample_factors.dedup();

        let channel_ids = opt_string_list(attrs, "channel_ids")?;
        let data_min = opt_f64(attrs, "data_min")?;
        let data_max = opt_f64(attrs, "data_max")?;

        Ok(Self {
            n_channels,
            n_samples,
            start_time_sec,
            sampling_frequency_hz,
            channel_ids,
            downsample_factors,
            data_min,
            data_max,
        })
    }

    /// Time of the last base-tier sample
    pub fn end_time_sec(&self) -> f64 {
        if self.n_samples == 0 {
            return self.start_time_sec;
        }
        self.start_time_sec + (self.n_samples as f64 - 1.0) / self.sampling_frequency_hz
    }

    pub fn total_duration_sec(&self) -> f64 {
        self.end_time_sec() - self.start_time_sec
    }

    /// Sample count of the tier identified by `factor`
    pub fn tier_len(&self, factor: u32) -> usize {
        let factor = factor.max(1) as usize;
        self.n_samples.div_ceil(factor)
    }

    /// Sampling frequency of the tier identified by `factor`
    pub fn tier_frequency_hz(&self, factor: u32) -> f64 {
        self.sampling_frequency_hz / factor.max(1) as f64
    }

    /// Storage name of the tier identified by `factor`
    pub fn tier_dataset_name(factor: u32) -> String {
        if factor <= 1 {
            "data".to_string()
        } else {
            format!("data_ds_{}", factor)
        }
    }
}

// -- Attribute extraction helpers (shared with the spectrogram catalog) --

fn require<'a>(attrs: &'a AttrMap, name: &str) -> Result<&'a Value, CatalogError> {
    attrs
        .get(name)
        .ok_or_else(|| CatalogError::MissingAttribute(name.to_string()))
}

fn malformed(name: &str, value: &Value, expected: &str) -> CatalogError {
    CatalogError::MalformedAttribute {
        name: name.to_string(),
        reason: format!("expected {}, got {}", expected, value),
    }
}

pub(crate) fn attr_f64(attrs: &AttrMap, name: &str) -> Result<f64, CatalogError> {
    let value = require(attrs, name)?;
    value
        .as_f64()
        .ok_or_else(|| malformed(name, value, "a number"))
}

pub(crate) fn attr_usize(attrs: &AttrMap, name: &str) -> Result<usize, CatalogError> {
    let value = require(attrs, name)?;
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| malformed(name, value, "a non-negative integer"))
}

pub(crate) fn opt_f64(attrs: &AttrMap, name: &str) -> Result<Option<f64>, CatalogError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(name, value, "a number")),
    }
}

pub(crate) fn opt_bool(attrs: &AttrMap, name: &str, default: bool) -> Result<bool, CatalogError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| malformed(name, value, "a boolean")),
    }
}

/// Optional list of downsample factors; each entry must be an integer > 1
pub(crate) fn opt_factor_list(attrs: &AttrMap, name: &str) -> Result<Vec<u32>, CatalogError> {
    let value = match attrs.get(name) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => value,
    };
    let items = value
        .as_array()
        .ok_or_else(|| malformed(name, value, "an array of integers"))?;
    let mut factors = Vec::with_capacity(items.len());
    for item in items {
        let factor = item
            .as_u64()
            .filter(|&f| f > 1 && f <= u32::MAX as u64)
            .ok_or_else(|| malformed(name, item, "an integer > 1"))?;
        factors.push(factor as u32);
    }
    Ok(factors)
}

/// Optional list of channel labels; numeric ids are stringified
pub(crate) fn opt_string_list(attrs: &AttrMap, name: &str) -> Result<Vec<String>, CatalogError> {
    let value = match attrs.get(name) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => value,
    };
    let items = value
        .as_array()
        .ok_or_else(|| malformed(name, value, "an array of labels"))?;
    let mut labels = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => labels.push(s.clone()),
            Value::Number(n) => labels.push(n.to_string()),
            other => return Err(malformed(name, other, "a string or number")),
        }
    }
    Ok(labels)
}
