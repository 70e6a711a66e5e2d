use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::store::{DatasetStore, RegionId};

/// Old and new value of a successful selection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

impl<T: PartialEq> Change<T> {
    /// `true` when the mutation re-selected the current value.
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }
}

/// The user's current region and horizon.
///
/// Both fields are always valid: the constructor checks the initial pair and
/// the mutators reject out-of-range input without touching the state.
#[derive(Debug, Clone)]
pub struct SelectionState {
    valid_regions: Arc<[RegionId]>,
    horizon_count: usize,
    region: RegionId,
    horizon: usize,
}

impl SelectionState {
    /// `valid_regions` must be sorted ascending.
    pub fn new(
        valid_regions: Arc<[RegionId]>,
        horizon_count: usize,
        region: RegionId,
        horizon: usize,
    ) -> Result<Self> {
        let mut state = Self {
            valid_regions,
            horizon_count,
            region,
            horizon: 0,
        };
        state.check_region(region)?;
        state.check_horizon(horizon)?;
        state.horizon = horizon;
        Ok(state)
    }

    /// Selection over the regions and horizons of `store`.
    pub fn for_store(store: &DatasetStore, region: RegionId, horizon: usize) -> Result<Self> {
        Self::new(store.valid_regions(), store.horizon_count(), region, horizon)
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn horizon_count(&self) -> usize {
        self.horizon_count
    }

    pub fn valid_regions(&self) -> &[RegionId] {
        &self.valid_regions
    }

    pub fn set_region(&mut self, region: RegionId) -> Result<Change<RegionId>> {
        self.check_region(region)?;
        let change = Change {
            old: self.region,
            new: region,
        };
        self.region = region;
        debug!(old = change.old, new = change.new, "Region selected");
        Ok(change)
    }

    pub fn set_horizon(&mut self, horizon: usize) -> Result<Change<usize>> {
        self.check_horizon(horizon)?;
        let change = Change {
            old: self.horizon,
            new: horizon,
        };
        self.horizon = horizon;
        debug!(old = change.old, new = change.new, "Horizon selected");
        Ok(change)
    }

    fn check_region(&self, region: RegionId) -> Result<()> {
        if self.valid_regions.binary_search(&region).is_ok() {
            Ok(())
        } else {
            warn!(region, "Rejected region outside the selectable set");
            Err(DashboardError::InvalidRegion(region))
        }
    }

    fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon < self.horizon_count {
            Ok(())
        } else {
            warn!(horizon, count = self.horizon_count, "Rejected horizon index");
            Err(DashboardError::InvalidHorizon {
                index: horizon,
                count: self.horizon_count,
            })
        }
    }
}

/// Display label for a horizon index, e.g. `Hour +1` for index 0.
pub fn horizon_label(horizon: usize) -> String {
    format!("Hour +{}", horizon + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectionState {
        SelectionState::new(Arc::from(vec![1075, 1130, 1282]), 6, 1075, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_defaults() {
        let regions: Arc<[RegionId]> = Arc::from(vec![1075]);
        assert_eq!(
            SelectionState::new(regions.clone(), 6, 1, 0).unwrap_err(),
            DashboardError::InvalidRegion(1)
        );
        assert_eq!(
            SelectionState::new(regions, 6, 1075, 6).unwrap_err(),
            DashboardError::InvalidHorizon { index: 6, count: 6 }
        );
    }

    #[test]
    fn test_set_region_returns_change() {
        let mut state = state();
        let change = state.set_region(1282).unwrap();
        assert_eq!(change, Change { old: 1075, new: 1282 });
        assert!(!change.is_noop());
        assert_eq!(state.region(), 1282);
    }

    #[test]
    fn test_set_region_rejects_unknown_region() {
        let mut state = state();
        assert_eq!(
            state.set_region(9999),
            Err(DashboardError::InvalidRegion(9999))
        );
        assert_eq!(state.region(), 1075);
    }

    #[test]
    fn test_set_horizon_bounds() {
        let mut state = state();
        assert_eq!(state.set_horizon(5).unwrap(), Change { old: 0, new: 5 });
        assert_eq!(
            state.set_horizon(6),
            Err(DashboardError::InvalidHorizon { index: 6, count: 6 })
        );
        assert_eq!(state.horizon(), 5);
    }

    #[test]
    fn test_reselecting_is_a_noop_change() {
        let mut state = state();
        assert!(state.set_region(1075).unwrap().is_noop());
        assert!(state.set_horizon(0).unwrap().is_noop());
    }

    #[test]
    fn test_horizon_label() {
        assert_eq!(horizon_label(0), "Hour +1");
        assert_eq!(horizon_label(5), "Hour +6");
    }
}
