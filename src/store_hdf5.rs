//! # HDF5 Store Binding
//!
//! Maps the [`ChunkedArrayStore`] contract onto one group of an HDF5 file:
//! group attributes become the JSON attribute map, datasets resolve by name,
//! and range reads become hyperslab selections. Reads are blocking libhdf5
//! calls executed inline; this binding targets local files, where a seek and
//! read is cheaper than a thread-pool round trip.
//!
//! Enabled with the `hdf5` cargo feature.

use async_trait::async_trait;
use hdf5::types::{FloatSize, IntSize, TypeDescriptor, VarLenUnicode};
use hdf5::Group;
use ndarray::{IxDyn, SliceInfo, SliceInfoElem};
use serde_json::{json, Value};

use crate::store::{AttrMap, ChunkedArrayStore, DataType, DatasetInfo, SliceRange};

/// Chunked-array store backed by one HDF5 group
pub struct Hdf5Store {
    group: Group,
    attrs: AttrMap,
}

impl Hdf5Store {
    /// Open a group and snapshot its attributes.
    ///
    /// Attributes are converted once here so later catalog parsing never
    /// touches libhdf5. Attributes with unsupported types are skipped.
    pub fn open(file: &hdf5::File, group_path: &str) -> Result<Self, hdf5::Error> {
        let group = if group_path.is_empty() || group_path == "/" {
            file.group("/")?
        } else {
            file.group(group_path)?
        };
        let attrs = read_group_attrs(&group)?;
        Ok(Self { group, attrs })
    }
}

#[async_trait]
impl ChunkedArrayStore for Hdf5Store {
    fn attrs(&self) -> &AttrMap {
        &self.attrs
    }

    async fn dataset(&self, name: &str) -> Option<DatasetInfo> {
        let ds = self.group.dataset(name).ok()?;
        let dtype = ds
            .dtype()
            .ok()
            .map(|t| match t.to_descriptor() {
                Ok(TypeDescriptor::Float(FloatSize::U8)) => DataType::Float64,
                Ok(TypeDescriptor::Integer(IntSize::U2)) => DataType::Int16,
                Ok(TypeDescriptor::Integer(IntSize::U4)) => DataType::Int32,
                Ok(TypeDescriptor::Integer(IntSize::U8)) => DataType::Int64,
                _ => DataType::Float32,
            })
            .unwrap_or(DataType::Float32);
        Some(DatasetInfo {
            shape: ds.shape(),
            dtype,
        })
    }

    async fn read(&self, name: &str, slices: &[SliceRange]) -> Option<Vec<f32>> {
        let ds = self.group.dataset(name).ok()?;
        if slices.is_empty() {
            return ds.read_raw::<f32>().ok();
        }

        let shape = ds.shape();
        if shape.len() != slices.len() {
            return None;
        }
        for (range, &dim) in slices.iter().zip(&shape) {
            if range.start > range.end || range.end > dim {
                return None;
            }
        }

        let elems: Vec<SliceInfoElem> = slices
            .iter()
            .map(|r| SliceInfoElem::Slice {
                start: r.start as isize,
                end: Some(r.end as isize),
                step: 1,
            })
            .collect();
        let selection: SliceInfo<_, IxDyn, IxDyn> = SliceInfo::try_from(elems).ok()?;
        let slab = ds.read_slice::<f32, _, IxDyn>(selection).ok()?;
        Some(slab.into_raw_vec())
    }
}

fn read_group_attrs(group: &Group) -> Result<AttrMap, hdf5::Error> {
    let mut attrs = AttrMap::new();
    for name in group.attr_names()? {
        let attr = group.attr(&name)?;
        match attr_to_json(&attr) {
            Some(value) => {
                attrs.insert(name, value);
            }
            None => {
                log::debug!("Skipping attribute with unsupported type: {}", name);
            }
        }
    }
    Ok(attrs)
}

/// Convert one scalar or 1-D attribute into a JSON value
fn attr_to_json(attr: &hdf5::Attribute) -> Option<Value> {
    let descriptor = attr.dtype().ok()?.to_descriptor().ok()?;
    let rank = attr.shape().len();
    match (rank, descriptor) {
        (0, TypeDescriptor::Integer(_)) => attr.read_scalar::<i64>().ok().map(|v| json!(v)),
        (0, TypeDescriptor::Unsigned(_)) => attr.read_scalar::<u64>().ok().map(|v| json!(v)),
        (0, TypeDescriptor::Float(_)) => attr.read_scalar::<f64>().ok().map(|v| json!(v)),
        (0, TypeDescriptor::Boolean) => attr.read_scalar::<bool>().ok().map(|v| json!(v)),
        (0, TypeDescriptor::VarLenUnicode) => attr
            .read_scalar::<VarLenUnicode>()
            .ok()
            .map(|v| json!(v.as_str())),
        (1, TypeDescriptor::Integer(_)) => attr.read_raw::<i64>().ok().map(|v| json!(v)),
        (1, TypeDescriptor::Unsigned(_)) => attr.read_raw::<u64>().ok().map(|v| json!(v)),
        (1, TypeDescriptor::Float(_)) => attr.read_raw::<f64>().ok().map(|v| json!(v)),
        (1, TypeDescriptor::VarLenUnicode) => attr.read_raw::<VarLenUnicode>().ok().map(|v| {
            json!(v.iter().map(|s| s.as_str().to_string()).collect::<Vec<_>>())
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TimeseriesClient;
    use ndarray::Array2;
    use tempfile::tempdir;

    fn write_fixture(path: &std::path::Path) -> hdf5::Result<()> {
        let file = hdf5::File::create(path)?;
        let group = file.create_group("series")?;

        for (name, value) in [("n_timepoints", 100i64), ("n_channels", 2)] {
            group
                .new_attr::<i64>()
                .create(name)?
                .write_scalar(&value)?;
        }
        for (name, value) in [("sampling_frequency_hz", 1000.0f64), ("start_time_sec", 0.0)] {
            group
                .new_attr::<f64>()
                .create(name)?
                .write_scalar(&value)?;
        }

        let values = Array2::from_shape_fn((100, 2), |(i, c)| (i * 2 + c) as f32);
        group
            .new_dataset::<f32>()
            .shape((100, 2))
            .create("data")?
            .write(&values)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_hdf5_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.h5");
        write_fixture(&path).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let store = Hdf5Store::open(&file, "series").unwrap();
        assert_eq!(store.attrs().get("n_channels").unwrap(), &json!(2));

        let client = TimeseriesClient::create(store).await.unwrap();
        let segment = client.get_visible_data(0.0, 0.0105, 800).await.unwrap();
        assert_eq!(segment.length, 12);
        assert_eq!(segment.data[1][3], 7.0);
    }

    #[tokio::test]
    async fn test_hdf5_missing_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.h5");
        write_fixture(&path).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let store = Hdf5Store::open(&file, "series").unwrap();
        assert!(store.read("data_ds_10", &[]).await.is_none());
    }
}
