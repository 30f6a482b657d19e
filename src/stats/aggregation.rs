//! Aggregation Engine
//! Grouped summary, daily resampling and wind sector averages over loaded tables.
//!
//! Null policy: a missing metric value is excluded from every mean, median, standard deviation,
//! min and max computed here. It is never counted as zero.

use crate::data::{CombinedTable, Metric, ObservationTable};
use crate::stats::calculator::{GroupStats, StatsCalculator};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Number of wind direction sectors.
pub const SECTOR_COUNT: usize = 16;

/// Angular width of one sector in degrees.
pub const SECTOR_WIDTH_DEG: f64 = 360.0 / SECTOR_COUNT as f64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Invalid metric '{0}'")]
    InvalidMetric(String),
}

/// Resolve a column name against the tables it will be read from.
fn resolve_metric<'a>(
    name: &str,
    tables: impl IntoIterator<Item = &'a ObservationTable>,
) -> Result<Metric, AggregationError> {
    let metric: Metric = name
        .parse()
        .map_err(|_| AggregationError::InvalidMetric(name.to_string()))?;

    if tables.into_iter().all(|t| t.has_metric(metric)) {
        Ok(metric)
    } else {
        Err(AggregationError::InvalidMetric(name.to_string()))
    }
}

/// Per-country statistics of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub metric: Metric,
    /// One row per country, sorted by country name.
    pub rows: Vec<GroupStats>,
}

impl SummaryTable {
    pub fn get(&self, country: &str) -> Option<&GroupStats> {
        self.rows.iter().find(|r| r.group_name == country)
    }
}

/// Mean and friends of `metric` for every country present in `table`.
///
/// A country whose values are all missing still gets a row, with NaN statistics.
pub fn summarize(table: &CombinedTable, metric: &str) -> Result<SummaryTable, AggregationError> {
    let metric = resolve_metric(metric, table.tables().iter().map(|t| &**t))?;

    let mut partitions: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (country, row) in table.rows() {
        let values = partitions.entry(country).or_default();
        if let Some(v) = row.get(metric) {
            values.push(v);
        }
    }

    let rows = partitions
        .into_iter()
        .map(|(country, values)| {
            let mut stats = StatsCalculator::compute_descriptive_stats(&values);
            stats.group_name = country.to_string();
            stats
        })
        .collect();

    Ok(SummaryTable { metric, rows })
}

/// One point of a daily-resampled series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Average `metric` per calendar day, ascending by date.
///
/// Days without rows are skipped, as are days whose rows all lack the metric.
pub fn daily_average(
    table: &ObservationTable,
    metric: &str,
) -> Result<Vec<DailyPoint>, AggregationError> {
    let metric = resolve_metric(metric, [table])?;

    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in &table.rows {
        if let Some(v) = row.get(metric) {
            let (sum, count) = days.entry(row.timestamp.date()).or_insert((0.0, 0));
            *sum += v;
            *count += 1;
        }
    }

    Ok(days
        .into_iter()
        .map(|(date, (sum, count))| DailyPoint {
            date,
            value: sum / count as f64,
        })
        .collect())
}

/// Sector index for a direction in degrees. A value on an edge belongs to the sector it starts.
pub fn sector_for(direction_deg: f64) -> usize {
    let index = (direction_deg / SECTOR_WIDTH_DEG).floor() as i64;
    index.rem_euclid(SECTOR_COUNT as i64) as usize
}

/// Angle in degrees at which a sector is drawn.
pub fn sector_center_degrees(sector: usize) -> f64 {
    sector as f64 * SECTOR_WIDTH_DEG
}

/// Mean wind speed per direction sector. Sectors with no observations are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindRose {
    pub sectors: BTreeMap<usize, f64>,
}

impl WindRose {
    pub fn get(&self, sector: usize) -> Option<f64> {
        self.sectors.get(&sector).copied()
    }

    pub fn max_speed(&self) -> Option<f64> {
        self.sectors.values().copied().reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Bin rows into 16 direction sectors and average `WS` within each.
///
/// Rows missing either `WD` or `WS` are dropped first.
pub fn wind_rose(table: &ObservationTable) -> WindRose {
    let mut bins: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for row in &table.rows {
        let (Some(wd), Some(ws)) = (row.wd, row.ws) else {
            continue;
        };
        let (sum, count) = bins.entry(sector_for(wd)).or_insert((0.0, 0));
        *sum += ws;
        *count += 1;
    }

    WindRose {
        sectors: bins
            .into_iter()
            .map(|(sector, (sum, count))| (sector, sum / count as f64))
            .collect(),
    }
}
