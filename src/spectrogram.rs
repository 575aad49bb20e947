//! # Spectrogram Client Module
//!
//! Adaptive-resolution access for spectrogram datasets: same tier catalog and
//! clamped range reads as the time-series client, but the second axis is
//! frequency rather than channel and downsampled tiers carry plain summarized
//! magnitudes, not min/max envelopes. Buffers stay flat row-major
//! `[time][frequency]` because heatmap painters consume them that way.
//!
//! Frequency bins are either uniform (`frequency_min_hz` + `frequency_delta_hz`)
//! or explicit (a `frequencies` dataset read once at construction).

use crate::catalog::{self, DatasetDescriptor};
use crate::error::{CatalogError, LoadError};
use crate::store::{ChunkedArrayStore, SliceRange};
use crate::tier::{select_tier, TierPlan};

/// One reconstructed run of visible spectrogram columns
#[derive(Debug, Clone)]
pub struct SpectrogramSegment {
    /// Flat row-major `[time][frequency]` magnitudes
    pub data: Vec<f32>,
    pub is_downsampled: bool,
    pub downsample_factor: u32,
    pub start_time_sec: f64,
    pub sampling_frequency: f64,
    pub length: usize,
    pub n_frequencies: usize,
}

impl SpectrogramSegment {
    fn empty(n_frequencies: usize, factor: u32, start_time_sec: f64, frequency: f64) -> Self {
        Self {
            data: Vec::new(),
            is_downsampled: factor > 1,
            downsample_factor: factor,
            start_time_sec,
            sampling_frequency: frequency,
            length: 0,
            n_frequencies,
        }
    }
}

/// Adaptive-resolution reader for one tiered spectrogram dataset
pub struct SpectrogramClient<S> {
    store: S,
    /// Time-axis catalog; the frequency axis plays the channel role
    descriptor: DatasetDescriptor,
    uniform_frequencies: bool,
    /// Center frequency of every bin, generated or read at construction
    bins: Vec<f32>,
    data_min: f64,
    data_max: f64,
}

impl<S: ChunkedArrayStore> SpectrogramClient<S> {
    /// Build a client from a spectrogram group.
    ///
    /// Required attributes: `n_frequencies`, `n_timepoints`,
    /// `sampling_frequency_hz`, `start_time_sec`, plus `frequency_min_hz`
    /// and `frequency_delta_hz` when `uniform_frequencies` (default true).
    /// Non-uniform groups must carry a `frequencies` dataset, read once
    /// here. Fatal on any missing or malformed piece.
    pub async fn create(store: S) -> Result<Self, CatalogError> {
        let attrs = store.attrs();
        let n_frequencies = catalog::attr_usize(attrs, "n_frequencies")?;
        let n_samples = catalog::attr_usize(attrs, "n_timepoints")?;
        let sampling_frequency_hz = catalog::attr_f64(attrs, "sampling_frequency_hz")?;
        let start_time_sec = catalog::attr_f64(attrs, "start_time_sec")?;
        let uniform_frequencies = catalog::opt_bool(attrs, "uniform_frequencies", true)?;
        let data_min = catalog::opt_f64(attrs, "data_min")?.unwrap_or(0.0);
        let data_max = catalog::opt_f64(attrs, "data_max")?.unwrap_or(1.0);
        let downsample_factors = {
            let mut factors = catalog::opt_factor_list(attrs, "downsample_factors")?;
            factors.sort_unstable();
            factors.dedup();
            factors
        };

        if !(sampling_frequency_hz > 0.0) || !sampling_frequency_hz.is_finite() {
            return Err(CatalogError::MalformedAttribute {
                name: "sampling_frequency_hz".to_string(),
                reason: format!("must be a positive number, got {}", sampling_frequency_hz),
            });
        }

        let bins = if uniform_frequencies {
            let min = catalog::attr_f64(attrs, "frequency_min_hz")?;
            let delta = catalog::attr_f64(attrs, "frequency_delta_hz")?;
            (0..n_frequencies)
                .map(|i| (min + i as f64 * delta) as f32)
                .collect()
        } else {
            store
                .read("frequencies", &[])
                .await
                .ok_or_else(|| CatalogError::MissingDataset("frequencies".to_string()))?
        };

        store
            .dataset("data")
            .await
            .ok_or_else(|| CatalogError::MissingDataset("data".to_string()))?;

        let descriptor = DatasetDescriptor {
            n_channels: n_frequencies,
            n_samples,
            start_time_sec,
            sampling_frequency_hz,
            channel_ids: Vec::new(),
            downsample_factors,
            data_min: Some(data_min),
            data_max: Some(data_max),
        };
        log::debug!(
            "Opened spectrogram: {} frequencies, {} columns, tiers {:?}",
            n_frequencies,
            n_samples,
            descriptor.downsample_factors
        );

        Ok(Self {
            store,
            descriptor,
            uniform_frequencies,
            bins,
            data_min,
            data_max,
        })
    }

    pub fn uniform_frequencies(&self) -> bool {
        self.uniform_frequencies
    }

    pub fn n_frequencies(&self) -> usize {
        self.descriptor.n_channels
    }

    pub fn n_timepoints(&self) -> usize {
        self.descriptor.n_samples
    }

    pub fn start_time_sec(&self) -> f64 {
        self.descriptor.start_time_sec
    }

    pub fn end_time_sec(&self) -> f64 {
        self.descriptor.end_time_sec()
    }

    pub fn sampling_frequency_hz(&self) -> f64 {
        self.descriptor.sampling_frequency_hz
    }

    pub fn data_range(&self) -> (f64, f64) {
        (self.data_min, self.data_max)
    }

    /// Center frequency of every bin, uniform or explicit
    pub fn frequency_bins(&self) -> &[f32] {
        &self.bins
    }

    /// Load the spectrogram columns visible in the window at a resolution
    /// fitted to `canvas_width_px`. Same tier selection and clamping rules
    /// as the time-series client; downsampled tiers have the same
    /// `[time][frequency]` layout as the base tier.
    pub async fn get_visible_data(
        &self,
        visible_start_sec: f64,
        visible_end_sec: f64,
        canvas_width_px: usize,
    ) -> Result<SpectrogramSegment, LoadError> {
        let d = &self.descriptor;
        let factor = select_tier(
            visible_end_sec - visible_start_sec,
            d.total_duration_sec(),
            d.n_samples,
            canvas_width_px,
            &d.downsample_factors,
        );

        let plan = match TierPlan::compute(d, factor, visible_start_sec, visible_end_sec) {
            Some(plan) => plan,
            None => {
                return Ok(SpectrogramSegment::empty(
                    self.n_frequencies(),
                    factor,
                    d.start_time_sec,
                    d.tier_frequency_hz(factor),
                ));
            }
        };

        let dataset = DatasetDescriptor::tier_dataset_name(factor);
        log::debug!(
            "Spectrogram window [{}, {}] @ {}px -> tier {} ({}), indices {}..{}",
            visible_start_sec,
            visible_end_sec,
            canvas_width_px,
            factor,
            dataset,
            plan.start_index,
            plan.start_index + plan.length
        );

        let raw = self
            .store
            .read(
                &dataset,
                &[plan.time_slice(), SliceRange::new(0, self.n_frequencies())],
            )
            .await
            .ok_or_else(|| LoadError::DataUnavailable {
                dataset: dataset.clone(),
            })?;

        let expected = plan.length * self.n_frequencies();
        if raw.len() < expected {
            return Err(LoadError::ShapeMismatch {
                dataset,
                expected,
                actual: raw.len(),
            });
        }
        let mut data = raw;
        data.truncate(expected);

        Ok(SpectrogramSegment {
            data,
            is_downsampled: factor > 1,
            downsample_factor: factor,
            start_time_sec: plan.start_time_sec,
            sampling_frequency: plan.sampling_frequency_hz,
            length: plan.length,
            n_frequencies: self.n_frequencies(),
        })
    }
}
