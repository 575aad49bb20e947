//! # Error Types Module
//!
//! Centralized error handling for the tiertrace crate.
//! Provides custom error types for each stage of the access layer.
//!
//! ## Error Types
//! - `CatalogError`: construction-time failures (missing/malformed attributes,
//!   unresolvable primary dataset). Fatal for the client instance: no client
//!   is produced and there is no degraded mode.
//! - `LoadError`: per-read failures (store returned no data, or a buffer whose
//!   shape disagrees with the requested range). Surfaced to the caller;
//!   `DataUnavailable` may be retried by re-invoking the read,
//!   `ShapeMismatch` indicates storage/metadata drift and will not heal.
//!
//! ## Why Custom Errors
//! - Callers can match on the failure stage and react differently
//! - Construction errors carry the attribute or dataset name that was at fault
//! - The statistics estimator is the only component with a non-error fallback
//!   path, so nothing here models "degraded" states

use std::fmt;

/// Errors that can occur while parsing a dataset group into a client
#[derive(Debug)]
pub enum CatalogError {
    /// A required group attribute is absent
    MissingAttribute(String),
    /// A group attribute is present but cannot be interpreted
    MalformedAttribute { name: String, reason: String },
    /// A dataset named in the catalog cannot be resolved in the store
    MissingDataset(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MissingAttribute(name) => {
                write!(f, "Missing required attribute: {}", name)
            }
            CatalogError::MalformedAttribute { name, reason } => {
                write!(f, "Malformed attribute {}: {}", name, reason)
            }
            CatalogError::MissingDataset(name) => {
                write!(f, "Dataset not found in store: {}", name)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Errors that can occur while loading and reconstructing a visible range
#[derive(Debug)]
pub enum LoadError {
    /// The store returned no data for a range read (network/storage failure).
    /// Not retried automatically; callers retry by re-issuing the read.
    DataUnavailable { dataset: String },
    /// The returned buffer length disagrees with the requested range.
    /// Indicates storage corruption or metadata drift; re-reading will not fix it.
    ShapeMismatch {
        dataset: String,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::DataUnavailable { dataset } => {
                write!(f, "Failed to load data from dataset: {}", dataset)
            }
            LoadError::ShapeMismatch {
                dataset,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Shape mismatch in dataset {}: expected {} values, got {}",
                    dataset, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::MissingAttribute("n_channels".to_string());
        assert!(err.to_string().contains("n_channels"));

        let err = CatalogError::MalformedAttribute {
            name: "sampling_frequency_hz".to_string(),
            reason: "must be > 0".to_string(),
        };
        assert!(err.to_string().contains("sampling_frequency_hz"));
        assert!(err.to_string().contains("must be > 0"));
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::DataUnavailable {
            dataset: "data_ds_100".to_string(),
        };
        assert!(err.to_string().contains("data_ds_100"));

        let err = LoadError::ShapeMismatch {
            dataset: "data".to_string(),
            expected: 128,
            actual: 96,
        };
        assert!(err.to_string().contains("128"));
        assert!(err.to_string().contains("96"));
    }
}
