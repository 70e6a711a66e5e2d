//! In-memory fixture dataset and scenario helpers for tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::bindings::{ViewSnapshot, ViewTarget};
use crate::query::derive_all;
use crate::session::Session;
use crate::store::{
    Coordinate, DatasetStore, HistoricalSeries, PredictionSet, RegionGeo, RegionId, TimePoint,
    DEFAULT_CELL_SIZE, HORIZON_COUNT,
};

/// Number of hourly slots in the fixture grid.
pub const FIXTURE_HOURS: usize = 48;

/// Fixture regions, deliberately unsorted and with a duplicate.
pub const FIXTURE_REGIONS: [RegionId; 4] = [1282, 1075, 1130, 1075];

/// `n` hours after 2016-06-01 00:00.
pub fn hour(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 6, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid fixture start")
        + chrono::Duration::hours(n)
}

fn historical_value(region: RegionId, slot: usize) -> f64 {
    ((region % 100) as f64) + ((slot * 7) % 24) as f64
}

/// Coordinate of a fixture region.
pub fn fixture_coordinate(region: RegionId) -> Coordinate {
    let column = (region % 50) as f64;
    let row = (region / 50) as f64;
    Coordinate::new(-8_260_000.0 + column * DEFAULT_CELL_SIZE, 4_940_000.0 + row * DEFAULT_CELL_SIZE)
}

/// A small, fully valid store.
///
/// Predictions at horizon index `h` start `h + 1` hours into the grid. Region
/// 1130 has no rows at the last horizon.
pub fn fixture_store() -> DatasetStore {
    let grid: Vec<NaiveDateTime> = (0..FIXTURE_HOURS as i64).map(hour).collect();

    let mut values: HashMap<RegionId, Vec<f64>> = HashMap::new();
    let mut coordinates = HashMap::new();
    for &region in &FIXTURE_REGIONS {
        values.insert(
            region,
            (0..FIXTURE_HOURS).map(|slot| historical_value(region, slot)).collect(),
        );
        coordinates.insert(region, fixture_coordinate(region));
    }

    let mut horizons = Vec::with_capacity(HORIZON_COUNT);
    for horizon in 0..HORIZON_COUNT {
        let mut by_region = HashMap::new();
        for &region in &FIXTURE_REGIONS {
            if region == 1130 && horizon == HORIZON_COUNT - 1 {
                continue;
            }
            let points = (horizon + 1..FIXTURE_HOURS)
                .map(|slot| {
                    TimePoint::new(
                        hour(slot as i64),
                        historical_value(region, slot - horizon - 1) + 0.5 * horizon as f64,
                    )
                })
                .collect::<Vec<_>>();
            by_region.insert(region, points);
        }
        horizons.push(by_region);
    }

    DatasetStore::new(
        FIXTURE_REGIONS.to_vec(),
        HistoricalSeries::new(grid, values),
        PredictionSet::new(horizons),
        RegionGeo::new(DEFAULT_CELL_SIZE, coordinates),
    )
    .expect("fixture store is valid")
}

/// A user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Region(RegionId),
    Horizon(usize),
}

/// A sequence of interactions on a fresh session and the selection expected
/// at the end.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub region: RegionId,
    pub horizon: usize,
    pub steps: Vec<Step>,
    pub expected_region: RegionId,
    pub expected_horizon: usize,
}

/// Replays `scenario` against the fixture store.
///
/// After every step it checks the refresh rules: rejected and repeated
/// selections touch no view, horizon changes touch only the predicted view,
/// and the sink always matches a fresh derivation of the current selection.
pub fn run_and_assert_scenario(scenario: &TestScenario) {
    let store = Arc::new(fixture_store());
    let mut session = Session::open(
        store.clone(),
        scenario.region,
        scenario.horizon,
        ViewSnapshot::new(),
    )
    .expect("scenario start selection is valid");

    for step in &scenario.steps {
        let before = session.sink().clone();
        let result = match *step {
            Step::Region(region) => session.set_region(region),
            Step::Horizon(horizon) => session.set_horizon(horizon),
        };

        match result {
            Err(_) => assert_eq!(session.sink(), &before, "rejected {:?} touched a view", step),
            Ok(refresh) if refresh.is_noop() => {
                assert_eq!(session.sink(), &before, "repeated {:?} touched a view", step)
            }
            Ok(refresh) => {
                let expected: Vec<ViewTarget> = match step {
                    Step::Region(_) => ViewTarget::ALL.to_vec(),
                    Step::Horizon(_) => vec![ViewTarget::Predicted],
                };
                assert_eq!(refresh.update.targets(), expected, "targets for {:?}", step);
                for target in ViewTarget::ALL {
                    let bump = u64::from(expected.contains(&target));
                    assert_eq!(session.sink().pushes(target), before.pushes(target) + bump);
                }
                if let Step::Horizon(_) = step {
                    assert_eq!(session.sink().historical(), before.historical());
                    assert_eq!(session.sink().map_highlight(), before.map_highlight());
                }
            }
        }

        let fresh = derive_all(&store, session.selection()).expect("current selection derives");
        assert_eq!(session.sink().views(), &fresh, "sink out of sync after {:?}", step);
    }

    assert_eq!(session.selection().region(), scenario.expected_region);
    assert_eq!(session.selection().horizon(), scenario.expected_horizon);
}
