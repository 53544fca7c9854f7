//! Dashboard configuration.
//!
//! Values come from an optional TOML file, then `CDI_DATASET`, then the command
//! line. Every field has a default so an empty or missing file is valid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Environment variable overriding the dataset path.
pub const DATASET_ENV: &str = "CDI_DATASET";

/// Which dashboard layout to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// KPIs, heatmap/histogram pair, detail table, sidebar filters and export.
    #[default]
    Full,
    /// Topic selector, time-series line chart and preview table.
    Simple,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    pub histogram_bins: usize,
    pub default_recent_years: usize,
    pub default_location: String,
    pub detail_rows: usize,
    pub preview_rows: usize,
    pub variant: Variant,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset/U.S._Chronic_Disease_Indicators.csv"),
            histogram_bins: 30,
            default_recent_years: 3,
            default_location: "United States".to_string(),
            detail_rows: 20,
            preview_rows: 10,
            variant: Variant::Full,
        }
    }
}

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "cdi-dashboard", about = "Chronic disease indicator dashboard")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset file (.csv, .json or .parquet)
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Dashboard layout
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Shorthand for `--variant simple`
    #[arg(long, conflicts_with = "variant")]
    pub simple: bool,
}

impl DashboardConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing dashboard config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Resolve the effective configuration: file, environment, then CLI flags.
    pub fn resolve(cli: &Cli, env_dataset: Option<String>) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                log::info!("Using config file {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        if let Some(path) = env_dataset.filter(|p| !p.is_empty()) {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(path) = &cli.dataset {
            config.dataset_path = path.clone();
        }
        if let Some(variant) = cli.variant {
            config.variant = variant;
        }
        if cli.simple {
            config.variant = Variant::Simple;
        }
        Ok(config)
    }
}
