//! Immutable, in-memory dataset behind every dashboard session.
//!
//! The store is built once at startup (usually by [`crate::loader`]) and then
//! shared read-only between sessions. Construction validates the invariants the
//! query layer relies on, so lookups never have to deal with ragged data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::error::{DashboardError, Result, StoreError};

/// Region identifier as used in the source data.
pub type RegionId = i64;

/// A point on the hourly timestamp grid.
pub type Timestamp = NaiveDateTime;

/// Number of precomputed prediction horizons in the source dataset.
pub const HORIZON_COUNT: usize = 6;

/// Side length of a region cell in map units, shared by every region.
pub const DEFAULT_CELL_SIZE: f64 = 1236.0;

/// A single observation or prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Map position of a region cell centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Historical values for every region on one shared timestamp grid.
#[derive(Debug, Clone, Default)]
pub struct HistoricalSeries {
    grid: Vec<Timestamp>,
    values: HashMap<RegionId, Vec<f64>>,
}

impl HistoricalSeries {
    pub fn new(grid: Vec<Timestamp>, values: HashMap<RegionId, Vec<f64>>) -> Self {
        Self { grid, values }
    }

    pub fn grid(&self) -> &[Timestamp] {
        &self.grid
    }

    pub fn values(&self, region: RegionId) -> Option<&[f64]> {
        self.values.get(&region).map(Vec::as_slice)
    }
}

/// Precomputed predictions, one map per horizon.
///
/// Horizon index `i` holds the predictions made `i + 1` hours ahead.
#[derive(Debug, Clone, Default)]
pub struct PredictionSet {
    horizons: Vec<HashMap<RegionId, Vec<TimePoint>>>,
}

impl PredictionSet {
    pub fn new(horizons: Vec<HashMap<RegionId, Vec<TimePoint>>>) -> Self {
        Self { horizons }
    }

    pub fn horizon_count(&self) -> usize {
        self.horizons.len()
    }

    /// Returns `None` for an unknown horizon, and an empty slice for a region
    /// without rows in a known horizon.
    pub fn series(&self, horizon: usize, region: RegionId) -> Option<&[TimePoint]> {
        self.horizons
            .get(horizon)
            .map(|by_region| by_region.get(&region).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Total number of prediction rows for a horizon.
    pub fn row_count(&self, horizon: usize) -> usize {
        self.horizons
            .get(horizon)
            .map(|by_region| by_region.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Region cell positions for the map.
#[derive(Debug, Clone)]
pub struct RegionGeo {
    cell_size: f64,
    coordinates: HashMap<RegionId, Coordinate>,
}

impl RegionGeo {
    pub fn new(cell_size: f64, coordinates: HashMap<RegionId, Coordinate>) -> Self {
        Self {
            cell_size,
            coordinates,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn coordinate(&self, region: RegionId) -> Option<Coordinate> {
        self.coordinates.get(&region).copied()
    }

    pub fn cells(&self) -> Vec<(RegionId, Coordinate)> {
        let mut cells: Vec<_> = self
            .coordinates
            .iter()
            .map(|(&region, &coord)| (region, coord))
            .collect();
        cells.sort_unstable_by_key(|(region, _)| *region);
        cells
    }
}

/// The validated dataset.
///
/// Lookup policy is strict: asking for a region outside [`DatasetStore::regions`]
/// fails with [`DashboardError::UnknownRegion`] instead of silently returning an
/// empty series.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    regions: Arc<[RegionId]>,
    historical: HistoricalSeries,
    predictions: PredictionSet,
    geo: RegionGeo,
}

impl DatasetStore {
    /// Builds a store and checks its invariants.
    ///
    /// `regions` is the selectable region set; it is sorted and deduplicated here.
    #[instrument(skip_all, fields(regions = regions.len()))]
    pub fn new(
        mut regions: Vec<RegionId>,
        historical: HistoricalSeries,
        predictions: PredictionSet,
        geo: RegionGeo,
    ) -> std::result::Result<Self, StoreError> {
        regions.sort_unstable();
        regions.dedup();

        if regions.is_empty() {
            return Err(StoreError::NoRegions);
        }
        if predictions.horizon_count() == 0 {
            return Err(StoreError::NoHorizons);
        }
        if !(geo.cell_size() > 0.0) {
            return Err(StoreError::InvalidCellSize(geo.cell_size()));
        }
        if let Some(position) = historical
            .grid()
            .windows(2)
            .position(|pair| pair[0] >= pair[1])
        {
            return Err(StoreError::UnsortedGrid(position + 1));
        }

        let expected = historical.grid().len();
        for &region in &regions {
            let values = historical
                .values(region)
                .ok_or(StoreError::MissingHistorical(region))?;
            if values.len() != expected {
                return Err(StoreError::GridLengthMismatch {
                    region,
                    expected,
                    actual: values.len(),
                });
            }
            if geo.coordinate(region).is_none() {
                return Err(StoreError::MissingCoordinate(region));
            }
        }

        for (horizon, by_region) in predictions.horizons.iter().enumerate() {
            for (&region, points) in by_region {
                for pair in points.windows(2) {
                    if pair[0].timestamp == pair[1].timestamp {
                        return Err(StoreError::DuplicatePrediction {
                            horizon,
                            region,
                            timestamp: pair[0].timestamp,
                        });
                    }
                    if pair[0].timestamp > pair[1].timestamp {
                        return Err(StoreError::UnsortedPredictions { horizon, region });
                    }
                }
            }
        }

        debug!(
            grid = expected,
            horizons = predictions.horizon_count(),
            "Dataset store validated"
        );

        Ok(Self {
            regions: regions.into(),
            historical,
            predictions,
            geo,
        })
    }

    /// Selectable regions, ascending.
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    /// Shared handle to the selectable region set.
    pub fn valid_regions(&self) -> Arc<[RegionId]> {
        Arc::clone(&self.regions)
    }

    pub fn contains_region(&self, region: RegionId) -> bool {
        self.regions.binary_search(&region).is_ok()
    }

    pub fn horizon_count(&self) -> usize {
        self.predictions.horizon_count()
    }

    /// The shared historical timestamp grid.
    pub fn grid(&self) -> &[Timestamp] {
        self.historical.grid()
    }

    pub fn cell_size(&self) -> f64 {
        self.geo.cell_size()
    }

    pub fn prediction_rows(&self, horizon: usize) -> usize {
        self.predictions.row_count(horizon)
    }

    /// Historical values aligned with [`DatasetStore::grid`].
    pub fn historical_values(&self, region: RegionId) -> Result<&[f64]> {
        self.ensure_region(region)?;
        self.historical
            .values(region)
            .ok_or(DashboardError::UnknownRegion(region))
    }

    /// Prediction points for a horizon index, sorted by timestamp.
    pub fn predicted_series(&self, horizon: usize, region: RegionId) -> Result<&[TimePoint]> {
        self.ensure_region(region)?;
        self.predictions
            .series(horizon, region)
            .ok_or(DashboardError::UnknownHorizon(horizon))
    }

    pub fn predicted_timestamps(&self, horizon: usize, region: RegionId) -> Result<Vec<Timestamp>> {
        Ok(self
            .predicted_series(horizon, region)?
            .iter()
            .map(|point| point.timestamp)
            .collect())
    }

    /// Prediction values, pairwise aligned with
    /// [`DatasetStore::predicted_timestamps`].
    pub fn predicted_values(&self, horizon: usize, region: RegionId) -> Result<Vec<f64>> {
        Ok(self
            .predicted_series(horizon, region)?
            .iter()
            .map(|point| point.value)
            .collect())
    }

    pub fn coordinate(&self, region: RegionId) -> Result<Coordinate> {
        self.ensure_region(region)?;
        self.geo
            .coordinate(region)
            .ok_or(DashboardError::UnknownRegion(region))
    }

    /// Every known region cell in region order, for the static map background.
    ///
    /// This may include cells that are not selectable.
    pub fn cells(&self) -> Vec<(RegionId, Coordinate)> {
        self.geo.cells()
    }

    fn ensure_region(&self, region: RegionId) -> Result<()> {
        if self.contains_region(region) {
            Ok(())
        } else {
            Err(DashboardError::UnknownRegion(region))
        }
    }
}
