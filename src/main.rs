//! Solar Dashboard - Solar Potential Comparison Dashboard
//!
//! Desktop dashboard comparing solar radiation metrics across countries.

mod charts;
mod gui;

use anyhow::Context;
use eframe::egui;
use gui::SolarDashboardApp;
use solar_dashboard::{DashboardConfig, CONFIG_FILE};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DashboardConfig::load(Path::new(CONFIG_FILE))?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        countries = ?config.countries,
        "starting dashboard"
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Solar Potential Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Solar Potential Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(SolarDashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))
    .context("failed to run dashboard window")
}
