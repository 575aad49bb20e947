//! # Resolution Tier Module
//!
//! Two pure pieces of arithmetic, kept free of I/O so they can be tested
//! exhaustively:
//!
//! - [`select_tier`]: maps a visible window and a canvas width onto the
//!   coarsest downsample factor that still delivers more than one point per
//!   pixel. Coarse enough to bound I/O and render cost by pixel width,
//!   never coarser than that, to avoid aliasing-driven misrepresentation.
//! - [`TierPlan`]: converts the visible window into a clamped, inclusive
//!   sample-index range in the chosen tier's own coordinate space.

use crate::catalog::DatasetDescriptor;
use crate::store::SliceRange;

/// Pick the downsample factor for a viewport.
///
/// Considers `{1} ∪ factors` in descending order and returns the first
/// (largest) factor `f` with `visible_samples / f > canvas_width_px`, where
/// `visible_samples = ceil(visible_duration / total_duration × total_samples)`.
/// When even the base tier fits within one point per pixel, returns 1.
///
/// Degenerate inputs (`total_duration_sec <= 0`, zero canvas width) select
/// the base tier without dividing.
pub fn select_tier(
    visible_duration_sec: f64,
    total_duration_sec: f64,
    total_samples: usize,
    canvas_width_px: usize,
    factors: &[u32],
) -> u32 {
    if total_duration_sec <= 0.0 || canvas_width_px == 0 {
        return 1;
    }
    let visible_samples =
        ((visible_duration_sec / total_duration_sec) * total_samples as f64).ceil();

    let mut candidates: Vec<u32> = Vec::with_capacity(factors.len() + 1);
    candidates.push(1);
    candidates.extend_from_slice(factors);
    candidates.sort_unstable_by(|a, b| b.cmp(a));

    for &factor in &candidates {
        if visible_samples / factor as f64 > canvas_width_px as f64 {
            return factor;
        }
    }
    1
}

/// Clamped sample-index range of one visible window in a tier's coordinates.
///
/// `start_index..start_index + length` indexes the tier dataset; the time
/// metadata locates the first returned sample on the shared time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPlan {
    pub factor: u32,
    pub start_index: usize,
    pub length: usize,
    pub start_time_sec: f64,
    pub sampling_frequency_hz: f64,
}

impl TierPlan {
    /// Compute the index range for `factor` covering the visible window.
    ///
    /// The window may extend beyond the dataset on either side; indices are
    /// clamped to `[0, tier_len - 1]`. Returns `None` when the clamped range
    /// is empty (window entirely outside the dataset, or an empty tier), in
    /// which case no read should be issued.
    pub fn compute(
        descriptor: &DatasetDescriptor,
        factor: u32,
        visible_start_sec: f64,
        visible_end_sec: f64,
    ) -> Option<TierPlan> {
        let tier_len = descriptor.tier_len(factor);
        if tier_len == 0 {
            return None;
        }
        let tier_freq = descriptor.tier_frequency_hz(factor);

        let start_f = ((visible_start_sec - descriptor.start_time_sec) * tier_freq).floor();
        let end_f = ((visible_end_sec - descriptor.start_time_sec) * tier_freq).ceil();
        if end_f < 0.0 {
            return None;
        }

        let start_index = start_f.max(0.0) as usize;
        if start_index >= tier_len {
            return None;
        }
        let end_index = (end_f as usize).min(tier_len - 1);
        if end_index < start_index {
            return None;
        }

        Some(TierPlan {
            factor,
            start_index,
            length: end_index - start_index + 1,
            start_time_sec: descriptor.start_time_sec + start_index as f64 / tier_freq,
            sampling_frequency_hz: tier_freq,
        })
    }

    /// Half-open time-axis slice for the store read
    pub fn time_slice(&self) -> SliceRange {
        SliceRange::new(self.start_index, self.start_index + self.length)
    }
}
