use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use commands::{inspect, serve};

#[derive(Parser)]
#[command(name = "taxicast")]
#[command(about = "Taxi demand forecast dashboard server and dataset tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Configuration file (TOML)
        ///
        /// Defaults to ./taxicast.toml when present. Every key can also be set
        /// through a TAXICAST_<KEY> environment variable.
        #[arg(short, long, env = "TAXICAST_CONFIG")]
        config: Option<PathBuf>,

        /// Directory with taxi_aggregate.csv, taxi_pred1h.csv .. taxi_pred6h.csv
        /// and regions.csv
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long)]
        bind_address: Option<String>,
    },
    /// Load the dataset and print a summary as JSON
    ///
    /// With --region, prints the views a session would show for that region
    /// instead.
    Inspect {
        /// Configuration file (TOML)
        #[arg(short, long, env = "TAXICAST_CONFIG")]
        config: Option<PathBuf>,

        /// Directory with the CSV dataset
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Region to derive views for
        #[arg(short, long)]
        region: Option<i64>,

        /// Horizon index (0 = one hour ahead), used with --region
        #[arg(long, default_value_t = 0)]
        horizon: usize,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { config, data_dir, bind_address } => {
                serve(config.as_deref(), data_dir, bind_address).await?;
            }
            Commands::Inspect { config, data_dir, region, horizon } => {
                inspect(config.as_deref(), data_dir, region, horizon)?;
            }
        }
        Ok(())
    }
}
