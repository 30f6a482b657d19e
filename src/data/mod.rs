//! Data module - per-country CSV loading, schema and caching

pub mod cache;
mod loader;
mod schema;

pub use cache::{CachedTable, DatasetCache};
pub use loader::{parse_timestamp, CsvSource, DatasetLoader, LoaderError, TableSource};
pub use schema::{
    CombinedTable, Metric, Observation, ObservationTable, UnknownMetric, TIMESTAMP_COL,
};
