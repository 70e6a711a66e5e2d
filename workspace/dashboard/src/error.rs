use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::error;

use crate::store::RegionId;

/// Errors raised while selecting or querying data for a dashboard session.
///
/// All of them are local validation failures: the caller rejects the input and
/// keeps its last valid state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// The region is not part of the selectable region set
    #[error("Invalid region: {0} is not a selectable region")]
    InvalidRegion(RegionId),

    /// The horizon index is outside `0..count`
    #[error("Invalid horizon index: {index} (expected 0..{count})")]
    InvalidHorizon { index: usize, count: usize },

    /// The dataset store has no data for the region
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    /// The dataset store has no prediction set for the horizon index
    #[error("Unknown horizon index: {0}")]
    UnknownHorizon(usize),
}

/// Errors raised when assembling a [`crate::store::DatasetStore`] from parts
/// that break its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Dataset has no regions")]
    NoRegions,

    #[error("Dataset has no prediction horizons")]
    NoHorizons,

    #[error("Historical timestamp grid is not strictly ascending at position {0}")]
    UnsortedGrid(usize),

    #[error("Region {0} has no historical series")]
    MissingHistorical(RegionId),

    #[error("Region {region} has {actual} historical values, grid has {expected}")]
    GridLengthMismatch {
        region: RegionId,
        expected: usize,
        actual: usize,
    },

    #[error("Region {0} has no map coordinate")]
    MissingCoordinate(RegionId),

    #[error("Predictions for region {region} at horizon index {horizon} are not sorted by timestamp")]
    UnsortedPredictions { horizon: usize, region: RegionId },

    #[error("Predictions for region {region} at horizon index {horizon} repeat timestamp {timestamp}")]
    DuplicatePrediction {
        horizon: usize,
        region: RegionId,
        timestamp: NaiveDateTime,
    },

    #[error("Cell size must be positive, got {0}")]
    InvalidCellSize(f64),
}

/// Errors raised by the CSV data loader.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A source file could not be found or opened
    #[error("Cannot read {path}: {message}")]
    File { path: String, message: String },

    /// Error from Polars DataFrame operations
    #[error("DataFrame error: {0}")]
    DataFrame(String),

    /// A required column is missing or has an unexpected type
    #[error("Column error: {0}")]
    Column(String),

    /// A timestamp cell could not be parsed
    #[error("Invalid timestamp '{value}' at row {row}")]
    Timestamp { row: usize, value: String },

    /// The long-format historical table has a hole
    #[error("No historical observation for region {region} at {timestamp}")]
    MissingObservation {
        region: RegionId,
        timestamp: NaiveDateTime,
    },

    /// The loaded parts do not form a valid store
    #[error("Invalid dataset: {0}")]
    Store(#[from] StoreError),
}

impl From<polars::error::PolarsError> for LoadError {
    fn from(error: polars::error::PolarsError) -> Self {
        let load_error = match error {
            polars::error::PolarsError::IO { .. } => {
                let err = LoadError::DataFrame(format!("I/O: {}", error));
                error!(?err, "DataFrame error: I/O");
                err
            }
            polars::error::PolarsError::ColumnNotFound(_) => {
                let err = LoadError::Column(format!("Column not found: {}", error));
                error!(?err, "DataFrame error: Column not found");
                err
            }
            polars::error::PolarsError::SchemaMismatch(_) => {
                let err = LoadError::Column(format!("Schema mismatch: {}", error));
                error!(?err, "DataFrame error: Schema mismatch");
                err
            }
            polars::error::PolarsError::ComputeError(_) => {
                let err = LoadError::DataFrame(format!("Compute error: {}", error));
                error!(?err, "DataFrame error: Compute error");
                err
            }
            _ => {
                let err = LoadError::DataFrame(error.to_string());
                error!(?err, "DataFrame error");
                err
            }
        };
        load_error
    }
}

/// Type alias for Result with DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;
