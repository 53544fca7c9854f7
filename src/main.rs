mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;
mod view;

use std::sync::Arc;

use anyhow::Context;
use app::DashboardApp;
use clap::Parser;
use config::{Cli, DashboardConfig, DATASET_ENV};
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = DashboardConfig::resolve(&cli, std::env::var(DATASET_ENV).ok())?;

    // The dataset is loaded exactly once and shared read-only with the UI.
    let dataset = data::loader::load_file(&config.dataset_path)
        .with_context(|| format!("loading dataset {}", config.dataset_path.display()))?;
    if dataset.is_empty() {
        log::warn!("Dataset {} has no rows", config.dataset_path.display());
    }
    let dataset = Arc::new(dataset);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Chronic Disease Indicators – Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(dataset, &config)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}
