//! Dashboard pipeline: selection in, aggregated view out.
//!
//! The view holds everything the presentation layer draws, so it never touches raw tables.

use crate::data::{CombinedTable, DatasetLoader, TableSource};
use crate::stats::{self, AggregationError, DailyPoint, SummaryTable, WindRose};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("No data available for selected countries")]
    NoData,
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// What the user currently has selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub countries: Vec<String>,
    pub metric: String,
    pub time_series_country: Option<String>,
    pub wind_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub country: String,
    pub points: Vec<DailyPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryWind {
    pub country: String,
    pub rose: WindRose,
}

/// Aggregated outputs for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Countries that actually had data, sorted.
    pub countries: Vec<String>,
    /// Non-missing samples of the metric per country, for distribution plots.
    pub distributions: BTreeMap<String, Vec<f64>>,
    pub summary: SummaryTable,
    pub daily: Option<DailySeries>,
    pub wind: Option<CountryWind>,
    /// At least one loaded country has wind columns.
    pub wind_available: bool,
}

/// Load the selected countries and compute every aggregate the dashboard shows.
pub fn build_view<S: TableSource>(
    loader: &DatasetLoader<S>,
    selection: &Selection,
) -> Result<DashboardView, PipelineError> {
    let data = loader.load_many(&selection.countries);
    if data.is_empty() {
        return Err(PipelineError::NoData);
    }

    let combined = CombinedTable::new(data.values().cloned());
    let summary = stats::summarize(&combined, &selection.metric)?;

    let distributions = data
        .iter()
        .map(|(country, table)| (country.clone(), table.values(summary.metric)))
        .collect();

    let daily = match selection
        .time_series_country
        .as_ref()
        .and_then(|c| data.get(c))
    {
        Some(table) => Some(DailySeries {
            country: table.country.clone(),
            points: stats::daily_average(table, &selection.metric)?,
        }),
        None => None,
    };

    let wind = selection
        .wind_country
        .as_ref()
        .and_then(|c| data.get(c))
        .filter(|t| t.has_wind)
        .map(|table| CountryWind {
            country: table.country.clone(),
            rose: stats::wind_rose(table),
        });

    info!(
        countries = data.len(),
        rows = combined.len(),
        metric = %summary.metric,
        "built dashboard view"
    );

    Ok(DashboardView {
        countries: data.keys().cloned().collect(),
        distributions,
        summary,
        daily,
        wind,
        wind_available: data.values().any(|t| t.has_wind),
    })
}
