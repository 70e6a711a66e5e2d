use anyhow::{Context, Result};
use config::{Config, Environment, File};
use dashboard::{
    loader::{load_dir, LoadOptions},
    store::DEFAULT_CELL_SIZE,
    DatasetStore, RegionId, SelectionState, DEFAULT_HORIZON, DEFAULT_REGION,
};
use moka::future::Cache;
use serde::Deserialize;
use std::{path::{Path, PathBuf}, sync::Arc, time::Duration};
use tracing::{debug, info};

use crate::schemas::{AppState, SessionDefaults};

/// Application configuration.
///
/// Sources, later ones winning: built-in defaults, `taxicast.toml` (or the file
/// passed with `--config`), `TAXICAST_*` environment variables, CLI flags.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Format: IP:PORT
    pub bind_address: String,
    /// Directory holding the CSV dataset
    pub data_dir: PathBuf,
    pub default_region: RegionId,
    pub default_horizon: usize,
    /// Optional allow-list of selectable regions
    pub regions: Option<Vec<RegionId>>,
    pub cell_size: f64,
    /// Keep holes in the historical table as gaps instead of failing to load
    pub keep_gaps: bool,
    /// Idle timeout: a session is dropped after this long without a request
    pub session_idle_secs: u64,
    pub max_sessions: u64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("data_dir", "data")?
            .set_default("default_region", DEFAULT_REGION)?
            .set_default("default_horizon", DEFAULT_HORIZON as i64)?
            .set_default("cell_size", DEFAULT_CELL_SIZE)?
            .set_default("keep_gaps", false)?
            .set_default("session_idle_secs", 1800_i64)?
            .set_default("max_sessions", 10_000_i64)?
            .set_default("request_timeout_secs", 30_i64)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("taxicast").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("TAXICAST")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("regions"),
            )
            .build()
            .context("Failed to read configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!(?app_config, "Configuration loaded");
        Ok(app_config)
    }

    /// Applies CLI flags on top of the loaded configuration.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, bind_address: Option<String>) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            regions: self.regions.clone(),
            cell_size: self.cell_size,
            keep_gaps: self.keep_gaps,
        }
    }
}

/// Load the dataset and build the application state
pub fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Loading dataset from {}", config.data_dir.display());
    let store = load_dir(&config.data_dir, &config.load_options())
        .with_context(|| format!("Failed to load dataset from {}", config.data_dir.display()))?;
    build_app_state(store, config)
}

/// Build the application state around an already loaded store
pub fn build_app_state(store: DatasetStore, config: &AppConfig) -> Result<AppState> {
    // Fail at startup rather than on the first session.
    SelectionState::for_store(&store, config.default_region, config.default_horizon)
        .context("Default selection is not valid for the loaded dataset")?;

    // Every lookup resets the idle clock, so active sessions never expire.
    let sessions = Cache::builder()
        .max_capacity(config.max_sessions)
        .time_to_idle(Duration::from_secs(config.session_idle_secs))
        .build();

    Ok(AppState {
        store: Arc::new(store),
        sessions,
        defaults: SessionDefaults {
            region: config.default_region,
            horizon: config.default_horizon,
        },
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    })
}
