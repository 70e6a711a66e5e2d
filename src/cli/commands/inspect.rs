use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use common::{DashboardViews, SelectionDto};
use dashboard::{horizon_label, loader::load_dir, DatasetStore, RegionId, Session, ViewSnapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::helpers::converters::{selection_to_dto, views_to_dto};

/// Prediction rows available for one horizon
#[derive(Debug, Serialize, PartialEq)]
pub struct HorizonSummary {
    pub index: usize,
    pub label: String,
    pub rows: usize,
}

/// Overview of a loaded dataset
#[derive(Debug, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub regions: usize,
    pub first_region: Option<RegionId>,
    pub last_region: Option<RegionId>,
    pub grid_points: usize,
    pub grid_start: Option<NaiveDateTime>,
    pub grid_end: Option<NaiveDateTime>,
    pub cell_size: f64,
    pub map_cells: usize,
    pub horizons: Vec<HorizonSummary>,
}

/// Views a fresh session shows for one selection
#[derive(Debug, Serialize)]
pub struct RegionReport {
    pub selection: SelectionDto,
    pub views: DashboardViews,
}

pub fn summarize(store: &DatasetStore) -> DatasetSummary {
    DatasetSummary {
        regions: store.regions().len(),
        first_region: store.regions().first().copied(),
        last_region: store.regions().last().copied(),
        grid_points: store.grid().len(),
        grid_start: store.grid().first().copied(),
        grid_end: store.grid().last().copied(),
        cell_size: store.cell_size(),
        map_cells: store.cells().len(),
        horizons: (0..store.horizon_count())
            .map(|index| HorizonSummary {
                index,
                label: horizon_label(index),
                rows: store.prediction_rows(index),
            })
            .collect(),
    }
}

pub fn region_report(store: Arc<DatasetStore>, region: RegionId, horizon: usize) -> Result<RegionReport> {
    let session = Session::open(store, region, horizon, ViewSnapshot::new())
        .with_context(|| format!("Cannot select region {} at horizon index {}", region, horizon))?;
    Ok(RegionReport {
        selection: selection_to_dto(session.selection()),
        views: views_to_dto(session.sink().views()),
    })
}

pub fn inspect(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
    region: Option<RegionId>,
    horizon: usize,
) -> Result<()> {
    let config = AppConfig::load(config_path)?.with_overrides(data_dir, None);
    info!("Inspecting dataset in {}", config.data_dir.display());

    let store = load_dir(&config.data_dir, &config.load_options())
        .with_context(|| format!("Failed to load dataset from {}", config.data_dir.display()))?;

    let output = match region {
        Some(region) => {
            debug!("Deriving views for region {} at horizon index {}", region, horizon);
            serde_json::to_string_pretty(&region_report(Arc::new(store), region, horizon)?)?
        }
        None => serde_json::to_string_pretty(&summarize(&store))?,
    };
    println!("{}", output);
    Ok(())
}
