//! Solar Dashboard - per-country solar irradiance and weather comparison
//!
//! Loads cleaned per-country CSV measurement files, caches them per country and aggregates them
//! into the summary table, daily series and wind sectors drawn by the dashboard.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::{ConfigError, DashboardConfig, CONFIG_FILE};
pub use pipeline::{build_view, DashboardView, PipelineError, Selection};
