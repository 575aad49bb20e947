//! # Timeseries Client Module
//!
//! The per-dataset entry point of the access layer. A client is constructed
//! once per dataset group (parsing the catalog from metadata only, no bulk
//! reads) and is then asked for "visible data" on every viewport change:
//! tier selection, one clamped range read, and per-channel reconstruction.
//!
//! ## Request lifecycle
//! Calls to [`TimeseriesClient::get_visible_data`] are independent and may be
//! issued concurrently during rapid panning; this layer neither serializes
//! nor coalesces them. A caller that drops a superseded future abandons its
//! in-flight read, so last-response-wins is a caller policy, not a contract
//! here. The lazily computed statistics cell is the only shared mutable
//! state; it transitions once from unset to set.

use tokio::sync::OnceCell;

use crate::catalog::DatasetDescriptor;
use crate::error::{CatalogError, LoadError};
use crate::segment::{split_channels, split_channels_min_max, LoadedSegment};
use crate::stats::{self, DataStats};
use crate::store::{ChunkedArrayStore, SliceRange};
use crate::tier::{select_tier, TierPlan};

/// Adaptive-resolution reader for one multi-channel tiered dataset
pub struct TimeseriesClient<S> {
    store: S,
    descriptor: DatasetDescriptor,
    stats: OnceCell<DataStats>,
}

impl<S: ChunkedArrayStore> TimeseriesClient<S> {
    /// Build a client from a dataset group.
    ///
    /// Validates the attribute map into an immutable descriptor and resolves
    /// the primary `data` dataset. Both steps are fatal on failure: no client
    /// is produced and there is no degraded mode. No bulk data is read here;
    /// statistics are computed lazily on first access.
    pub async fn create(store: S) -> Result<Self, CatalogError> {
        let descriptor = DatasetDescriptor::from_attrs(store.attrs())?;
        let info = store
            .dataset("data")
            .await
            .ok_or_else(|| CatalogError::MissingDataset("data".to_string()))?;
        log::debug!(
            "Opened tiered dataset: {} channels, {} samples, shape {:?}, tiers {:?}",
            descriptor.n_channels,
            descriptor.n_samples,
            info.shape,
            descriptor.downsample_factors
        );

        Ok(Self {
            store,
            descriptor,
            stats: OnceCell::new(),
        })
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn n_channels(&self) -> usize {
        self.descriptor.n_channels
    }

    pub fn n_samples(&self) -> usize {
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

    pub fn channel_ids(&self) -> &[String] {
        &self.descriptor.channel_ids
    }

    /// Load the samples visible in `[visible_start_sec, visible_end_sec]`
    /// at a resolution fitted to `canvas_width_px`.
    ///
    /// Picks the coarsest tier still delivering more than one point per
    /// pixel, issues exactly one range read over the time axis and the full
    /// channel axis (plus the min/max axis on downsampled tiers), and splits
    /// the buffer into per-channel arrays. The window may extend beyond the
    /// dataset; indices are clamped. A window that misses the dataset
    /// entirely yields a zero-length segment without touching the store.
    pub async fn get_visible_data(
        &self,
        visible_start_sec: f64,
        visible_end_sec: f64,
        canvas_width_px: usize,
    ) -> Result<LoadedSegment, LoadError> {
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
                return Ok(LoadedSegment::empty(
                    d.n_channels,
                    factor,
                    d.start_time_sec,
                    d.tier_frequency_hz(factor),
                ));
            }
        };

        let dataset = DatasetDescriptor::tier_dataset_name(factor);
        let slices = if factor == 1 {
            vec![plan.time_slice(), SliceRange::new(0, d.n_channels)]
        } else {
            vec![
                plan.time_slice(),
                SliceRange::new(0, 2),
                SliceRange::new(0, d.n_channels),
            ]
        };
        log::debug!(
            "Visible window [{}, {}] @ {}px -> tier {} ({}), indices {}..{}",
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
            .read(&dataset, &slices)
            .await
            .ok_or_else(|| LoadError::DataUnavailable {
                dataset: dataset.clone(),
            })?;

        let data = if factor == 1 {
            split_channels(&raw, plan.length, d.n_channels, &dataset)?
        } else {
            split_channels_min_max(&raw, plan.length, d.n_channels, &dataset)?
        };

        Ok(LoadedSegment {
            data,
            is_downsampled: factor > 1,
            downsample_factor: factor,
            start_time_sec: plan.start_time_sec,
            sampling_frequency: plan.sampling_frequency_hz,
            length: plan.length,
        })
    }

    /// Estimated dataset statistics, computed once and cached for the
    /// client's lifetime. Never fails; see the stats module for the
    /// documented fallback.
    pub async fn stats(&self) -> DataStats {
        *self
            .stats
            .get_or_init(|| stats::estimate(&self.store, &self.descriptor))
            .await
    }

    /// Base spacing unit for stacked-channel rendering
    pub async fn base_spacing_unit(&self) -> f64 {
        self.stats().await.spacing
    }

    /// Estimated global data range.
    ///
    /// Uses the writer-provided `data_min`/`data_max` attributes when
    /// present (no read); otherwise refined from the first statistics pass.
    pub async fn estimated_data_range(&self) -> (f64, f64) {
        if let (Some(min), Some(max)) = (self.descriptor.data_min, self.descriptor.data_max) {
            return (min, max);
        }
        let stats = self.stats().await;
        (stats.data_min, stats.data_max)
    }
}
