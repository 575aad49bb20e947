//! # tiertrace
//!
//! Adaptive-resolution access to tiered scientific time-series and
//! spectrogram datasets stored in chunked array stores.
//!
//! Large recordings are stored with precomputed downsample tiers (factor `f`
//! tiers hold `ceil(n / f)` min/max envelope points under `data_ds_<f>`).
//! Given a visible time window and a canvas pixel width, a client picks the
//! coarsest tier still delivering more than one point per pixel, issues one
//! clamped range read against the store, and reconstructs per-channel arrays
//! ready for plotting. I/O and render cost stay proportional to pixel width
//! at every zoom level.
//!
//! ## Usage
//! ```no_run
//! use tiertrace::{MemoryStore, TimeseriesClient};
//! # async fn example(store: MemoryStore) -> Result<(), Box<dyn std::error::Error>> {
//! let client = TimeseriesClient::create(store).await?;
//! let segment = client.get_visible_data(12.0, 15.0, 800).await?;
//! for (label, trace) in client.channel_ids().iter().zip(&segment.data) {
//!     // hand `trace` to the painter
//!     let _ = (label, trace);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## What this crate is not
//! No rendering, no tier computation (tiers must already be materialized in
//! storage), no segment caching, no automatic retry, no request coalescing.
//! Overlapping `get_visible_data` calls are independent; drop a superseded
//! future to abandon its read.

mod catalog;
mod client;
mod error;
mod segment;
mod spectrogram;
mod stats;
mod store;
#[cfg(feature = "hdf5")]
mod store_hdf5;
mod tier;

pub use catalog::DatasetDescriptor;
pub use client::TimeseriesClient;
pub use error::{CatalogError, LoadError};
pub use segment::LoadedSegment;
pub use spectrogram::{SpectrogramClient, SpectrogramSegment};
pub use stats::DataStats;
pub use store::{AttrMap, ChunkedArrayStore, DataType, DatasetInfo, MemoryStore, SliceRange};
#[cfg(feature = "hdf5")]
pub use store_hdf5::Hdf5Store;
pub use tier::{select_tier, TierPlan};
