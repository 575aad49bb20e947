//! # Chunked Array Store Module
//!
//! The storage abstraction the access layer reads from: named multi-dimensional
//! datasets with metadata (shape, dtype) living under a group that carries a
//! JSON-valued attribute map. The layer depends only on the read contract here;
//! chunking, caching, timeouts and transport belong to the implementation.
//!
//! ## Contract
//! - `dataset(name)` resolves a dataset handle without reading bulk data
//! - `read(name, slices)` returns a flat row-major buffer for one hyperslab,
//!   or `None` when the data cannot be produced (network/storage failure)
//! - An empty slice list selects the whole dataset
//!
//! ## Implementations
//! - [`MemoryStore`]: complete in-process implementation backed by flat
//!   vectors. Used by the test suites and useful for embedding synthetic data.
//! - `Hdf5Store` (feature `hdf5`): maps the contract onto an HDF5 group.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Group-level attribute map (JSON values, as stored by the writers)
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

/// Half-open index range `[start, end)` along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Element type of a stored dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Float32,
    Float64,
    Int16,
    Int32,
    Int64,
}

/// Dataset handle metadata, resolvable without any bulk read
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub shape: Vec<usize>,
    pub dtype: DataType,
}

/// Read contract for hierarchical chunked-array storage.
///
/// Buffers are normalized to `f32` by the implementation (matching the
/// precision the rendering consumers work in), row-major in the dataset's
/// axis order.
#[async_trait]
pub trait ChunkedArrayStore: Send + Sync {
    /// Attribute map of the group this store exposes
    fn attrs(&self) -> &AttrMap;

    /// Resolve a dataset by name, or `None` if it does not exist
    async fn dataset(&self, name: &str) -> Option<DatasetInfo>;

    /// Read one hyperslab as a flat row-major buffer.
    ///
    /// `slices` gives a half-open range per axis; an empty list selects the
    /// whole dataset. Returns `None` on failure or when the request does not
    /// fit the dataset's shape.
    async fn read(&self, name: &str, slices: &[SliceRange]) -> Option<Vec<f32>>;
}

struct MemoryDataset {
    shape: Vec<usize>,
    values: Vec<f32>,
}

/// In-process store backed by flat vectors.
///
/// Intended for tests and synthetic data; implements the exact same slicing
/// semantics remote stores provide.
pub struct MemoryStore {
    attrs: AttrMap,
    datasets: HashMap<String, MemoryDataset>,
}

impl MemoryStore {
    pub fn new(attrs: AttrMap) -> Self {
        Self {
            attrs,
            datasets: HashMap::new(),
        }
    }

    /// Insert a dataset with the given shape.
    ///
    /// Fails if the value count does not match the shape's element count.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        shape: Vec<usize>,
        values: Vec<f32>,
    ) -> Result<(), String> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(format!(
                "Dataset shape {:?} needs {} values, got {}",
                shape,
                expected,
                values.len()
            ));
        }
        self.datasets
            .insert(name.into(), MemoryDataset { shape, values });
        Ok(())
    }
}

#[async_trait]
impl ChunkedArrayStore for MemoryStore {
    fn attrs(&self) -> &AttrMap {
        &self.attrs
    }

    async fn dataset(&self, name: &str) -> Option<DatasetInfo> {
        self.datasets.get(name).map(|ds| DatasetInfo {
            shape: ds.shape.clone(),
            dtype: DataType::Float32,
        })
    }

    async fn read(&self, name: &str, slices: &[SliceRange]) -> Option<Vec<f32>> {
        let ds = self.datasets.get(name)?;
        if slices.is_empty() {
            return Some(ds.values.clone());
        }
        extract_slab(&ds.shape, &ds.values, slices)
    }
}

/// Copy one row-major hyperslab out of a flat buffer.
///
/// Returns `None` when the slice list does not match the dataset's rank or
/// runs outside its bounds.
fn extract_slab(shape: &[usize], values: &[f32], ranges: &[SliceRange]) -> Option<Vec<f32>> {
    if ranges.len() != shape.len() || shape.is_empty() {
        return None;
    }
    for (range, &dim) in ranges.iter().zip(shape) {
        if range.start > range.end || range.end > dim {
            return None;
        }
    }
    if ranges.iter().any(|r| r.is_empty()) {
        return Some(Vec::new());
    }

    let ndim = shape.len();
    let mut strides = vec![1usize; ndim];
    for axis in (0..ndim - 1).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }

    let out_len: usize = ranges.iter().map(|r| r.len()).product();
    let mut out = Vec::with_capacity(out_len);

    // Odometer over the outer axes; the innermost axis is copied contiguously.
    let last = ndim - 1;
    let mut index: Vec<usize> = ranges.iter().map(|r| r.start).collect();
    loop {
        let base: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
        out.extend_from_slice(&values[base..base + ranges[last].len()]);

        let mut axis = last;
        loop {
            if axis == 0 {
                return Some(out);
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < ranges[axis].end {
                break;
            }
            index[axis] = ranges[axis].start;
        }
    }
}
