//! Pure derivations from the dataset store to the value objects each view shows.

use crate::error::Result;
use crate::selection::SelectionState;
use crate::store::{DatasetStore, RegionId, Timestamp};

/// Historical line of the time-series chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoricalView {
    pub x: Vec<Timestamp>,
    pub y: Vec<f64>,
}

/// Predicted line of the time-series chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictedView {
    pub x: Vec<Timestamp>,
    pub y: Vec<f64>,
}

/// Highlighted cell on the map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapHighlight {
    pub x: f64,
    pub y: f64,
}

/// All three views for one selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedViews {
    pub historical: HistoricalView,
    pub predicted: PredictedView,
    pub map_highlight: MapHighlight,
}

pub fn derive_historical(store: &DatasetStore, region: RegionId) -> Result<HistoricalView> {
    let y = store.historical_values(region)?.to_vec();
    Ok(HistoricalView {
        x: store.grid().to_vec(),
        y,
    })
}

pub fn derive_predicted(
    store: &DatasetStore,
    horizon: usize,
    region: RegionId,
) -> Result<PredictedView> {
    let series = store.predicted_series(horizon, region)?;
    let (x, y) = series
        .iter()
        .map(|point| (point.timestamp, point.value))
        .unzip();
    Ok(PredictedView { x, y })
}

pub fn derive_map_highlight(store: &DatasetStore, region: RegionId) -> Result<MapHighlight> {
    let coordinate = store.coordinate(region)?;
    Ok(MapHighlight {
        x: coordinate.x,
        y: coordinate.y,
    })
}

pub fn derive_all(store: &DatasetStore, selection: &SelectionState) -> Result<DerivedViews> {
    Ok(DerivedViews {
        historical: derive_historical(store, selection.region())?,
        predicted: derive_predicted(store, selection.horizon(), selection.region())?,
        map_highlight: derive_map_highlight(store, selection.region())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::testing::fixture_store;

    #[test]
    fn test_historical_length_matches_grid_for_every_region() {
        let store = fixture_store();
        for &region in store.regions() {
            let view = derive_historical(&store, region).unwrap();
            assert_eq!(view.x.len(), store.grid().len());
            assert_eq!(view.y.len(), store.grid().len());
        }
    }

    #[test]
    fn test_predicted_axes_have_equal_length() {
        let store = fixture_store();
        for &region in store.regions() {
            for horizon in 0..store.horizon_count() {
                let view = derive_predicted(&store, horizon, region).unwrap();
                assert_eq!(view.x.len(), view.y.len());
            }
        }
    }

    #[test]
    fn test_predicted_view_matches_store_accessors() {
        let store = fixture_store();
        let view = derive_predicted(&store, 3, 1282).unwrap();
        assert_eq!(view.x, store.predicted_timestamps(3, 1282).unwrap());
        assert_eq!(view.y, store.predicted_values(3, 1282).unwrap());
    }

    #[test]
    fn test_map_highlight_is_region_coordinate() {
        let store = fixture_store();
        let coordinate = store.coordinate(1282).unwrap();
        let highlight = derive_map_highlight(&store, 1282).unwrap();
        assert_eq!(highlight.x, coordinate.x);
        assert_eq!(highlight.y, coordinate.y);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let store = fixture_store();
        let selection = SelectionState::for_store(&store, 1130, 4).unwrap();
        assert_eq!(
            derive_all(&store, &selection).unwrap(),
            derive_all(&store, &selection).unwrap()
        );
    }

    #[test]
    fn test_unknown_region_propagates() {
        let store = fixture_store();
        assert_eq!(
            derive_historical(&store, 42),
            Err(DashboardError::UnknownRegion(42))
        );
    }
}
