//! Dataset Loader Module
//! Resolves per-country CSV files, validates them against the observation schema and caches the
//! result per country.

use crate::config::DashboardConfig;
use crate::data::cache::{CachedTable, DatasetCache};
use crate::data::schema::{Metric, Observation, ObservationTable, TIMESTAMP_COL};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("{country}: missing required column '{column}'")]
    MissingColumn { country: String, column: String },
    #[error("{country}: unparseable timestamp '{value}' at row {row}")]
    InvalidTimestamp {
        country: String,
        row: usize,
        value: String,
    },
}

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp cell. Offsets are normalized to UTC; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Where observation tables come from.
pub trait TableSource: Send + Sync {
    /// Read the table for `country`. `Ok(None)` means there is no source for it.
    fn read(&self, country: &str) -> Result<Option<ObservationTable>, LoaderError>;
}

/// Reads `<data_dir>/<lowercased country><suffix>` files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    data_dir: PathBuf,
    file_suffix: String,
}

impl CsvSource {
    pub fn new(data_dir: impl Into<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_suffix: file_suffix.into(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(&config.data_dir, &config.file_suffix)
    }

    pub fn path_for(&self, country: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", country.to_lowercase(), self.file_suffix))
    }
}

impl TableSource for CsvSource {
    fn read(&self, country: &str) -> Result<Option<ObservationTable>, LoaderError> {
        let path = self.path_for(country);
        if !path.is_file() {
            debug!(country, path = %path.display(), "no source file");
            return Ok(None);
        }

        // Infer over the whole file: a column that is integral for its first rows must not lose
        // later fractional values.
        let df = LazyCsvReader::new(&path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let table = frame_to_table(country, &df)?;
        info!(
            country,
            rows = table.len(),
            wind = table.has_wind,
            "loaded dataset from {}",
            path.display()
        );
        Ok(Some(table))
    }
}

/// Validate a raw frame against the observation schema and convert it to typed rows.
pub(crate) fn frame_to_table(
    country: &str,
    df: &DataFrame,
) -> Result<ObservationTable, LoaderError> {
    let column = |name: &str| {
        df.column(name).map_err(|_| LoaderError::MissingColumn {
            country: country.to_string(),
            column: name.to_string(),
        })
    };

    let timestamps = column(TIMESTAMP_COL)?.cast(&DataType::String)?;
    let mut rows = Vec::with_capacity(df.height());
    for (row, cell) in timestamps.str()?.into_iter().enumerate() {
        let timestamp = cell.and_then(parse_timestamp).ok_or_else(|| {
            LoaderError::InvalidTimestamp {
                country: country.to_string(),
                row,
                value: cell.unwrap_or_default().to_string(),
            }
        })?;
        rows.push(Observation::at(timestamp));
    }

    let has_wind = Metric::WIND
        .iter()
        .all(|m| df.column(m.column()).is_ok());

    let metrics = Metric::REQUIRED
        .iter()
        .chain(Metric::WIND.iter().filter(|_| has_wind));
    for &metric in metrics {
        let values = column(metric.column())?.cast(&DataType::Float64)?;
        for (row, value) in rows.iter_mut().zip(values.f64()?.into_iter()) {
            row.set(metric, value);
        }
    }

    Ok(ObservationTable::new(country, rows, has_wind))
}

/// Loads observation tables and keeps them for the loader's lifetime.
pub struct DatasetLoader<S = CsvSource> {
    source: S,
    cache: DatasetCache,
}

impl DatasetLoader<CsvSource> {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(CsvSource::from_config(config))
    }
}

impl<S: TableSource> DatasetLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, DatasetCache::new())
    }

    pub fn with_cache(source: S, cache: DatasetCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Load one country. `Ok(None)` means no data exists for it.
    ///
    /// Present and absent outcomes are cached; errors are not, so a later call reads again.
    pub fn load(&self, country: &str) -> Result<CachedTable, LoaderError> {
        self.cache.with_slot(country, |slot| -> Result<CachedTable, LoaderError> {
            if let Some(cached) = &**slot {
                debug!(country, "dataset cache hit");
                return Ok(cached.clone());
            }

            let table = self.source.read(country)?.map(Arc::new);
            **slot = Some(table.clone());
            Ok(table)
        })
    }

    /// Load several countries in parallel, keeping only those with data.
    ///
    /// Countries without a source, or whose load failed, are left out of the result.
    pub fn load_many<I, T>(&self, countries: I) -> BTreeMap<String, Arc<ObservationTable>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let ids: BTreeSet<String> = countries
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();

        ids.par_iter()
            .filter_map(|id| match self.load(id) {
                Ok(Some(table)) => Some((id.clone(), table)),
                Ok(None) => {
                    debug!(country = %id, "skipping country without data");
                    None
                }
                Err(e) => {
                    warn!(country = %id, error = %e, "skipping country that failed to load");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    const HEADER: &str = "Timestamp,GHI,DNI,DHI,ModA,Tamb,RH,WS,WD\n";

    fn write_csv(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn benin_csv() -> String {
        format!(
            "{HEADER}\
             2021-08-09 00:01,-1.2,0.0,0.0,0.0,26.2,93.4,0.6,122.1\n\
             2021-08-09 00:02,,0.0,0.0,0.0,26.2,93.6,0.6,\n\
             2021-08-10 12:00,850.5,700.1,120.3,0.0,31.0,60.2,2.1,200.0\n"
        )
    }

    struct CountingSource {
        inner: CsvSource,
        reads: AtomicUsize,
    }

    impl TableSource for CountingSource {
        fn read(&self, country: &str) -> Result<Option<ObservationTable>, LoaderError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(country)
        }
    }

    /// Counts reads and takes a while to answer, so overlapping loads really overlap.
    struct SlowSource {
        reads: AtomicUsize,
    }

    impl TableSource for SlowSource {
        fn read(&self, country: &str) -> Result<Option<ObservationTable>, LoaderError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(Some(ObservationTable::new(country, Vec::new(), false)))
        }
    }

    fn counting_loader(dir: &Path) -> DatasetLoader<CountingSource> {
        DatasetLoader::new(CountingSource {
            inner: CsvSource::new(dir, "_clean.csv"),
            reads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn path_is_lowercased_id_plus_suffix() {
        let source = CsvSource::new("data", "_clean.csv");
        assert_eq!(
            source.path_for("Sierra Leone"),
            PathBuf::from("data").join("sierra leone_clean.csv")
        );
    }

    #[test]
    fn parses_supported_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-01 12:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T13:30:00+01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn loads_and_tags_rows() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "benin_clean.csv", &benin_csv());

        let loader = counting_loader(dir.path());
        let table = loader.load("Benin").unwrap().expect("benin has data");

        assert_eq!(table.country, "Benin");
        assert_eq!(table.len(), 3);
        assert!(table.has_wind);
        assert_eq!(table.rows[0].ghi, Some(-1.2));
        assert_eq!(table.rows[1].ghi, None);
        assert_eq!(table.rows[1].wd, None);
        assert_eq!(table.rows[2].ws, Some(2.1));
        assert_eq!(
            table.rows[2].timestamp,
            NaiveDate::from_ymd_opt(2021, 8, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn second_load_is_a_cache_hit() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "benin_clean.csv", &benin_csv());

        let loader = counting_loader(dir.path());
        let first = loader.load("Benin").unwrap();
        let second = loader.load("Benin").unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_file_is_absent_and_cached() {
        let dir = TempDir::new().unwrap();
        let loader = counting_loader(dir.path());

        assert_eq!(loader.load("Togo").unwrap(), None);
        assert_eq!(loader.load("Togo").unwrap(), None);
        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clearing_the_cache_forces_a_reread() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "benin_clean.csv", &benin_csv());

        let loader = counting_loader(dir.path());
        loader.load("Benin").unwrap();
        loader.cache().clear();
        loader.load("Benin").unwrap();

        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bad_timestamp_fails_only_that_country() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "benin_clean.csv", &benin_csv());
        write_csv(
            dir.path(),
            "togo_clean.csv",
            &format!("{HEADER}not-a-date,1,1,1,0,20,50,1,90\n"),
        );

        let loader = counting_loader(dir.path());
        let err = loader.load("Togo").unwrap_err();
        assert!(matches!(err, LoaderError::InvalidTimestamp { row: 0, .. }));

        let loaded = loader.load_many(["Benin", "Togo"]);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("Benin"));
    }

    #[test]
    fn failed_loads_are_retried() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "togo_clean.csv",
            &format!("{HEADER}not-a-date,1,1,1,0,20,50,1,90\n"),
        );

        let loader = counting_loader(dir.path());
        assert!(loader.load("Togo").is_err());
        assert!(loader.load("Togo").is_err());
        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_required_column_fails_the_load() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "benin_clean.csv",
            "Timestamp,GHI,DNI,DHI,Tamb\n2024-01-01 00:00,1,2,3,4\n",
        );

        let loader = counting_loader(dir.path());
        match loader.load("Benin") {
            Err(LoaderError::MissingColumn { column, .. }) => assert_eq!(column, "RH"),
            other => panic!("expected missing RH column, got {other:?}"),
        }
    }

    #[test]
    fn wind_needs_both_columns() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "benin_clean.csv",
            "Timestamp,GHI,DNI,DHI,Tamb,RH,WS\n2024-01-01 00:00,1,2,3,4,5,6\n",
        );

        let loader = counting_loader(dir.path());
        let table = loader.load("Benin").unwrap().unwrap();
        assert!(!table.has_wind);
        assert_eq!(table.rows[0].ws, None);
    }

    #[test]
    fn load_many_omits_absent_countries() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "benin_clean.csv", &benin_csv());
        write_csv(dir.path(), "sierra leone_clean.csv", &benin_csv());

        let loader = counting_loader(dir.path());
        let loaded = loader.load_many(["Benin", "Sierra Leone", "Togo", "Benin"]);

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["Sierra Leone"].country, "Sierra Leone");
        assert!(!loaded.contains_key("Togo"));
        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn fractional_values_after_integral_rows_are_kept() {
        let dir = TempDir::new().unwrap();
        let mut csv = String::from("Timestamp,GHI,DNI,DHI,Tamb,RH\n");
        for i in 0..10_001 {
            writeln!(csv, "2024-01-01 00:00,0,{i},0,25,80").unwrap();
        }
        csv.push_str("2024-01-02 12:00,12.5,1.5,0,25.5,60\n");
        write_csv(dir.path(), "benin_clean.csv", &csv);

        let loader = counting_loader(dir.path());
        let table = loader.load("Benin").unwrap().unwrap();

        assert_eq!(table.len(), 10_002);
        assert_eq!(table.rows[0].ghi, Some(0.0));
        let last = table.rows.last().unwrap();
        assert_eq!(last.ghi, Some(12.5));
        assert_eq!(last.dni, Some(1.5));
        assert_eq!(last.tamb, Some(25.5));
    }

    #[test]
    fn concurrent_loads_of_one_country_read_once() {
        let loader = DatasetLoader::new(SlowSource {
            reads: AtomicUsize::new(0),
        });

        let tables: Vec<CachedTable> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| loader.load("Benin").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loader.source().reads.load(Ordering::SeqCst), 1);
        let first = tables[0].as_ref().unwrap();
        assert!(tables
            .iter()
            .all(|t| Arc::ptr_eq(t.as_ref().unwrap(), first)));
    }
}
