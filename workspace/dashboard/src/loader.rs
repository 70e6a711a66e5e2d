//! CSV loader for the taxi demand dataset.
//!
//! Expected files in the data directory:
//! - `taxi_aggregate.csv`: `date, region, trip_count` in long format
//! - `taxi_pred{n}h.csv` for `n` in `1..=6`: `date, region, y`
//! - `regions.csv`: `region, x0, y0`
//!
//! The historical table is pivoted onto one shared timestamp grid. Repeated
//! `(date, region)` rows are averaged. A hole in the grid is an error unless
//! [`LoadOptions::keep_gaps`] is set, in which case it is stored as `NaN`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, Column, CsvReadOptions, DataFrame, SerReader};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::LoadError;
use crate::store::{
    Coordinate, DatasetStore, HistoricalSeries, PredictionSet, RegionGeo, RegionId, TimePoint,
    Timestamp, DEFAULT_CELL_SIZE, HORIZON_COUNT,
};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Regions offered in the region picker when no allow-list is configured.
pub const SELECTABLE_REGIONS: &[RegionId] = &[
    1075, 1076, 1077, 1125, 1126, 1127, 1128, 1129, 1130, 1131, 1132, 1172,
    1173, 1174, 1175, 1176, 1177, 1178, 1179, 1180, 1181, 1182, 1183, 1184,
    1221, 1222, 1223, 1224, 1225, 1227, 1228, 1229, 1230, 1231, 1232, 1233,
    1234, 1235, 1272, 1273, 1274, 1278, 1279, 1280, 1281, 1282, 1283, 1284,
    1285, 1286, 1287, 1326, 1327, 1331, 1332, 1333, 1334, 1335, 1336, 1337,
    1338, 1339, 1376, 1377, 1378, 1380, 1382, 1383, 1384, 1385, 1386, 1387,
    1388, 1389, 1390, 1426, 1431, 1434, 1435, 1436, 1437, 1438, 1439, 1441,
    1442, 1480, 1482, 1483, 1530, 1532, 1533, 1580, 1630, 1684, 1733, 1734,
    1783, 2068, 2069, 2118, 2119, 2168,
];

/// Locations of the source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub historical: PathBuf,
    pub predictions: Vec<PathBuf>,
    pub regions: PathBuf,
}

impl DataFiles {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            historical: dir.join("taxi_aggregate.csv"),
            predictions: (1..=HORIZON_COUNT)
                .map(|hours| dir.join(format!("taxi_pred{}h.csv", hours)))
                .collect(),
            regions: dir.join("regions.csv"),
        }
    }
}

/// Knobs that are not part of the files themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Selectable regions. Every listed region must have historical data.
    /// `None` selects the [`SELECTABLE_REGIONS`] that the historical table
    /// covers.
    pub regions: Option<Vec<RegionId>>,
    /// Map cell size shared by all regions.
    pub cell_size: f64,
    /// Store missing historical observations as `NaN` instead of failing.
    pub keep_gaps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            regions: None,
            cell_size: DEFAULT_CELL_SIZE,
            keep_gaps: false,
        }
    }
}

/// Loads and validates the dataset from the standard files in `dir`.
pub fn load_dir(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<DatasetStore, LoadError> {
    load_dataset(&DataFiles::in_dir(dir), options)
}

#[instrument(skip(options))]
pub fn load_dataset(files: &DataFiles, options: &LoadOptions) -> Result<DatasetStore, LoadError> {
    trace!("Entering load_dataset");

    let historical_frame = read_csv(&files.historical)?;
    let (grid, by_region) = pivot_historical(&historical_frame, options.keep_gaps)?;
    debug!(
        rows = historical_frame.height(),
        grid = grid.len(),
        regions = by_region.len(),
        "Historical table pivoted"
    );

    let mut horizons = Vec::with_capacity(files.predictions.len());
    for (index, path) in files.predictions.iter().enumerate() {
        let frame = read_csv(path)?;
        let by_region = read_predictions(&frame)?;
        debug!(horizon = index, rows = frame.height(), "Prediction table loaded");
        horizons.push(by_region);
    }

    let coordinates = read_coordinates(&read_csv(&files.regions)?)?;

    let regions = match &options.regions {
        Some(allowed) => {
            for region in allowed {
                if !by_region.contains_key(region) {
                    warn!(region, "Selectable region has no historical data");
                }
            }
            allowed.clone()
        }
        None => {
            let (covered, missing): (Vec<RegionId>, Vec<RegionId>) = SELECTABLE_REGIONS
                .iter()
                .partition(|region| by_region.contains_key(*region));
            if !missing.is_empty() {
                warn!(?missing, "Regions without historical data are not selectable");
            }
            covered
        }
    };

    let store = DatasetStore::new(
        regions,
        HistoricalSeries::new(grid, by_region),
        PredictionSet::new(horizons),
        RegionGeo::new(options.cell_size, coordinates),
    )?;

    info!(
        regions = store.regions().len(),
        grid = store.grid().len(),
        horizons = store.horizon_count(),
        "Dataset loaded"
    );
    Ok(store)
}

fn read_csv(path: &Path) -> Result<DataFrame, LoadError> {
    if !path.is_file() {
        return Err(LoadError::File {
            path: path.display().to_string(),
            message: "file not found".to_string(),
        });
    }
    trace!(path = %path.display(), "Reading CSV");
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(frame)
}

fn column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column, LoadError> {
    frame
        .column(name)
        .map_err(|e| LoadError::Column(format!("Missing {} column: {}", name, e)))
}

fn cell<'a>(column: &'a Column, row: usize) -> Result<AnyValue<'a>, LoadError> {
    column
        .get(row)
        .map_err(|e| LoadError::Column(format!("Error getting {} at row {}: {}", column.name(), row, e)))
}

fn region_at(column: &Column, row: usize) -> Result<RegionId, LoadError> {
    cell(column, row)?
        .try_extract::<i64>()
        .map_err(|e| LoadError::Column(format!("Error extracting region at row {}: {}", row, e)))
}

fn number_at(column: &Column, row: usize) -> Result<f64, LoadError> {
    cell(column, row)?.try_extract::<f64>().map_err(|e| {
        LoadError::Column(format!(
            "Error extracting {} as f64 at row {}: {}",
            column.name(),
            row,
            e
        ))
    })
}

fn timestamp_at(column: &Column, row: usize) -> Result<Timestamp, LoadError> {
    let text = match cell(column, row)? {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Null => String::new(),
        other => format!("{}", other),
    };
    parse_timestamp(&text).ok_or(LoadError::Timestamp { row, value: text })
}

/// Parses the timestamp formats pandas writes; a bare date means midnight.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn pivot_historical(
    frame: &DataFrame,
    keep_gaps: bool,
) -> Result<(Vec<Timestamp>, HashMap<RegionId, Vec<f64>>), LoadError> {
    let dates = column(frame, "date")?;
    let regions = column(frame, "region")?;
    let counts = column(frame, "trip_count")?;

    // (sum, rows) per region and timestamp
    let mut cells: BTreeMap<RegionId, BTreeMap<Timestamp, (f64, u32)>> = BTreeMap::new();
    let mut grid = BTreeSet::new();
    for row in 0..frame.height() {
        let timestamp = timestamp_at(dates, row)?;
        let region = region_at(regions, row)?;
        let value = number_at(counts, row)?;
        let entry = cells
            .entry(region)
            .or_default()
            .entry(timestamp)
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
        grid.insert(timestamp);
    }

    let grid: Vec<Timestamp> = grid.into_iter().collect();
    let mut by_region = HashMap::with_capacity(cells.len());
    for (region, observed) in cells {
        let values = grid
            .iter()
            .map(|timestamp| match observed.get(timestamp) {
                Some((sum, rows)) => Ok(sum / f64::from(*rows)),
                None if keep_gaps => Ok(f64::NAN),
                None => Err(LoadError::MissingObservation {
                    region,
                    timestamp: *timestamp,
                }),
            })
            .collect::<Result<Vec<f64>, LoadError>>()?;
        let gaps = values.iter().filter(|value| value.is_nan()).count();
        if gaps > 0 {
            debug!(region, gaps, "Historical series has gaps");
        }
        by_region.insert(region, values);
    }
    Ok((grid, by_region))
}

fn read_predictions(frame: &DataFrame) -> Result<HashMap<RegionId, Vec<TimePoint>>, LoadError> {
    let dates = column(frame, "date")?;
    let regions = column(frame, "region")?;
    let values = column(frame, "y")?;

    let mut by_region: HashMap<RegionId, Vec<TimePoint>> = HashMap::new();
    for row in 0..frame.height() {
        let point = TimePoint::new(timestamp_at(dates, row)?, number_at(values, row)?);
        by_region
            .entry(region_at(regions, row)?)
            .or_default()
            .push(point);
    }
    // Rows may come in any order; duplicates are left for the store to reject.
    for points in by_region.values_mut() {
        points.sort_by_key(|point| point.timestamp);
    }
    Ok(by_region)
}

fn read_coordinates(frame: &DataFrame) -> Result<HashMap<RegionId, Coordinate>, LoadError> {
    let regions = column(frame, "region")?;
    let xs = column(frame, "x0")?;
    let ys = column(frame, "y0")?;

    let mut coordinates = HashMap::with_capacity(frame.height());
    for row in 0..frame.height() {
        let region = region_at(regions, row)?;
        let coordinate = Coordinate::new(number_at(xs, row)?, number_at(ys, row)?);
        if coordinates.insert(region, coordinate).is_some() {
            warn!(region, "Region listed twice in regions file, keeping the last row");
        }
    }
    Ok(coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DashboardError, StoreError};
    use std::fs;
    use tempfile::TempDir;

    const REGIONS: &str = "region,x0,y0\n1075,-8238000.5,4970000.0\n1282,-8233056.0,4975000.0\n1130,-8240000.0,4971000.0\n";

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("write fixture file");
    }

    fn write_predictions(dir: &Path) {
        for hours in 1..=HORIZON_COUNT {
            let mut contents = String::from("date,region,y\n");
            // Written newest first to exercise sorting.
            for slot in (hours..3).rev() {
                contents.push_str(&format!(
                    "2016-06-01 0{}:00:00,1075,{}.5\n",
                    slot,
                    10 * hours + slot
                ));
            }
            contents.push_str(&format!("2016-06-01 02:00:00,1282,{}\n", hours));
            write(dir, &format!("taxi_pred{}h.csv", hours), &contents);
        }
    }

    fn dataset_dir() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        write(
            dir.path(),
            "taxi_aggregate.csv",
            "date,region,trip_count\n\
             2016-06-01 01:00:00,1075,12\n\
             2016-06-01 00:00:00,1075,10\n\
             2016-06-01 02:00:00,1075,14\n\
             2016-06-01 00:00:00,1282,3\n\
             2016-06-01 01:00:00,1282,4\n\
             2016-06-01 02:00:00,1282,5\n",
        );
        write_predictions(dir.path());
        write(dir.path(), "regions.csv", REGIONS);
        dir
    }

    #[test]
    fn test_standard_file_names() {
        let files = DataFiles::in_dir("data");
        assert_eq!(files.historical, PathBuf::from("data/taxi_aggregate.csv"));
        assert_eq!(files.predictions.len(), HORIZON_COUNT);
        assert_eq!(files.predictions[5], PathBuf::from("data/taxi_pred6h.csv"));
        assert_eq!(files.regions, PathBuf::from("data/regions.csv"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2016, 6, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2016-06-01 13:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2016-06-01T13:00:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2016-06-01 13:00 "), Some(expected));
        assert_eq!(
            parse_timestamp("2016-06-01"),
            NaiveDate::from_ymd_opt(2016, 6, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("June 1st"), None);
    }

    #[test]
    fn test_load_pivots_historical_table() {
        let dir = dataset_dir();
        let store = load_dir(dir.path(), &LoadOptions::default()).unwrap();

        assert_eq!(store.regions(), &[1075, 1282]);
        assert_eq!(store.grid().len(), 3);
        assert_eq!(store.historical_values(1075).unwrap(), &[10.0, 12.0, 14.0]);
        assert_eq!(store.historical_values(1282).unwrap(), &[3.0, 4.0, 5.0]);
        assert_eq!(store.horizon_count(), HORIZON_COUNT);
        assert_eq!(store.cell_size(), DEFAULT_CELL_SIZE);
    }

    #[test]
    fn test_load_sorts_prediction_rows() {
        let dir = dataset_dir();
        let store = load_dir(dir.path(), &LoadOptions::default()).unwrap();

        let timestamps = store.predicted_timestamps(0, 1075).unwrap();
        assert_eq!(timestamps.len(), 2);
        assert!(timestamps[0] < timestamps[1]);
        assert_eq!(store.predicted_values(0, 1075).unwrap(), vec![11.5, 12.5]);
        assert_eq!(store.predicted_values(2, 1282).unwrap(), vec![3.0]);
        // Horizon +3 starts at slot 3, past the fixture's last slot.
        assert!(store.predicted_values(2, 1075).unwrap().is_empty());
    }

    #[test]
    fn test_coordinates_include_unselectable_cells() {
        let dir = dataset_dir();
        let store = load_dir(dir.path(), &LoadOptions::default()).unwrap();

        assert_eq!(store.cells().len(), 3);
        assert_eq!(store.coordinate(1075).unwrap().x, -8238000.5);
        assert_eq!(
            store.coordinate(1130),
            Err(DashboardError::UnknownRegion(1130))
        );
    }

    #[test]
    fn test_region_allow_list() {
        let dir = dataset_dir();
        let options = LoadOptions {
            regions: Some(vec![1282]),
            cell_size: 500.0,
            ..Default::default()
        };
        let store = load_dir(dir.path(), &options).unwrap();
        assert_eq!(store.regions(), &[1282]);
        assert_eq!(store.cell_size(), 500.0);
    }

    #[test]
    fn test_allow_list_with_unknown_region_fails() {
        let dir = dataset_dir();
        let options = LoadOptions {
            regions: Some(vec![1282, 4242]),
            ..Default::default()
        };
        let err = load_dir(dir.path(), &options).unwrap_err();
        assert!(matches!(err, LoadError::Store(StoreError::MissingHistorical(4242))));
    }

    #[test]
    fn test_duplicate_rows_are_averaged() {
        let dir = dataset_dir();
        write(
            dir.path(),
            "taxi_aggregate.csv",
            "date,region,trip_count\n\
             2016-06-01 00:00:00,1075,10\n\
             2016-06-01 00:00:00,1075,20\n",
        );
        let options = LoadOptions {
            regions: Some(vec![1075]),
            ..Default::default()
        };
        let store = load_dir(dir.path(), &options).unwrap();
        assert_eq!(store.historical_values(1075).unwrap(), &[15.0]);
    }

    const AGGREGATE_WITH_UNLISTED_REGION: &str = "date,region,trip_count\n\
         2016-06-01 00:00:00,1075,10\n\
         2016-06-01 01:00:00,1075,11\n\
         2016-06-01 00:00:00,1282,3\n\
         2016-06-01 01:00:00,1282,4\n\
         2016-06-01 00:00:00,9999,7\n\
         2016-06-01 01:00:00,9999,8\n";

    #[test]
    fn test_selectable_regions_list_is_sorted() {
        assert_eq!(SELECTABLE_REGIONS.len(), 102);
        assert!(SELECTABLE_REGIONS.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(SELECTABLE_REGIONS.contains(&crate::DEFAULT_REGION));
    }

    #[test]
    fn test_region_outside_default_list_is_not_selectable() {
        let dir = dataset_dir();
        write(dir.path(), "taxi_aggregate.csv", AGGREGATE_WITH_UNLISTED_REGION);

        let store = load_dir(dir.path(), &LoadOptions::default()).unwrap();

        assert_eq!(store.regions(), &[1075, 1282]);
        assert_eq!(
            store.historical_values(9999),
            Err(DashboardError::UnknownRegion(9999))
        );
    }

    #[test]
    fn test_allow_list_replaces_default_list() {
        let dir = dataset_dir();
        write(dir.path(), "taxi_aggregate.csv", AGGREGATE_WITH_UNLISTED_REGION);
        write(
            dir.path(),
            "regions.csv",
            &format!("{}9999,-8250000.0,4960000.0\n", REGIONS),
        );
        let options = LoadOptions {
            regions: Some(vec![1075, 9999]),
            ..Default::default()
        };

        let store = load_dir(dir.path(), &options).unwrap();

        assert_eq!(store.regions(), &[1075, 9999]);
        assert_eq!(store.historical_values(9999).unwrap(), &[7.0, 8.0]);
    }

    #[test]
    fn test_keep_gaps_stores_missing_observation_as_nan() {
        let dir = dataset_dir();
        write(
            dir.path(),
            "taxi_aggregate.csv",
            "date,region,trip_count\n\
             2016-06-01 00:00:00,1075,10\n\
             2016-06-01 01:00:00,1075,11\n\
             2016-06-01 00:00:00,1282,3\n",
        );
        let options = LoadOptions {
            keep_gaps: true,
            ..Default::default()
        };

        let store = load_dir(dir.path(), &options).unwrap();

        assert_eq!(store.historical_values(1075).unwrap(), &[10.0, 11.0]);
        let values = store.historical_values(1282).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], 3.0);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_hole_in_historical_grid_fails() {
        let dir = dataset_dir();
        write(
            dir.path(),
            "taxi_aggregate.csv",
            "date,region,trip_count\n\
             2016-06-01 00:00:00,1075,10\n\
             2016-06-01 01:00:00,1075,11\n\
             2016-06-01 00:00:00,1282,3\n",
        );
        let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingObservation { region: 1282, .. }
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = dataset_dir();
        fs::remove_file(dir.path().join("taxi_pred4h.csv")).unwrap();
        let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::File { path, .. } => assert!(path.ends_with("taxi_pred4h.csv")),
            other => panic!("expected missing file error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_fails() {
        let dir = dataset_dir();
        write(dir.path(), "regions.csv", "region,x,y\n1075,1.0,2.0\n");
        let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Column(_)));
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let dir = dataset_dir();
        write(
            dir.path(),
            "taxi_pred1h.csv",
            "date,region,y\nyesterday,1075,1.0\n",
        );
        let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 0, .. }));
    }
}
