//! Stats module - descriptive statistics and aggregation

pub mod aggregation;
mod calculator;

pub use aggregation::{
    daily_average, sector_center_degrees, sector_for, summarize, wind_rose, AggregationError,
    DailyPoint, SummaryTable, WindRose, SECTOR_COUNT, SECTOR_WIDTH_DEG,
};
pub use calculator::{BoxSummary, GroupStats, StatsCalculator};
