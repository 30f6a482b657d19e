//! Observation Schema Module
//! Typed row layout for the per-country measurement tables.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Name of the timestamp column in every source file.
pub const TIMESTAMP_COL: &str = "Timestamp";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

/// Numeric columns understood by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Ghi,
    Dni,
    Dhi,
    Tamb,
    Rh,
    Wd,
    Ws,
}

impl Metric {
    /// Columns every source file must provide.
    pub const REQUIRED: [Metric; 5] = [
        Metric::Ghi,
        Metric::Dni,
        Metric::Dhi,
        Metric::Tamb,
        Metric::Rh,
    ];

    /// Wind columns, only used when both are present.
    pub const WIND: [Metric; 2] = [Metric::Wd, Metric::Ws];

    /// Column name in the source CSV.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Ghi => "GHI",
            Metric::Dni => "DNI",
            Metric::Dhi => "DHI",
            Metric::Tamb => "Tamb",
            Metric::Rh => "RH",
            Metric::Wd => "WD",
            Metric::Ws => "WS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::Ghi => "Global Horizontal Irradiance",
            Metric::Dni => "Direct Normal Irradiance",
            Metric::Dhi => "Diffuse Horizontal Irradiance",
            Metric::Tamb => "Ambient Temperature",
            Metric::Rh => "Relative Humidity",
            Metric::Wd => "Wind Direction",
            Metric::Ws => "Wind Speed",
        }
    }

    pub fn is_wind(self) -> bool {
        matches!(self, Metric::Wd | Metric::Ws)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Column names match exactly, as they appear in the CSV header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::REQUIRED
            .iter()
            .chain(Metric::WIND.iter())
            .copied()
            .find(|m| m.column() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// One timestamped sample. Missing and NaN cells are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
    pub tamb: Option<f64>,
    pub rh: Option<f64>,
    pub wd: Option<f64>,
    pub ws: Option<f64>,
}

impl Observation {
    /// Row with only a timestamp set.
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            ghi: None,
            dni: None,
            dhi: None,
            tamb: None,
            rh: None,
            wd: None,
            ws: None,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ghi => self.ghi,
            Metric::Dni => self.dni,
            Metric::Dhi => self.dhi,
            Metric::Tamb => self.tamb,
            Metric::Rh => self.rh,
            Metric::Wd => self.wd,
            Metric::Ws => self.ws,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let value = value.filter(|v| !v.is_nan());
        match metric {
            Metric::Ghi => self.ghi = value,
            Metric::Dni => self.dni = value,
            Metric::Dhi => self.dhi = value,
            Metric::Tamb => self.tamb = value,
            Metric::Rh => self.rh = value,
            Metric::Wd => self.wd = value,
            Metric::Ws => self.ws = value,
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

/// All observations loaded for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    pub country: String,
    pub rows: Vec<Observation>,
    /// Both `WD` and `WS` were present in the source.
    pub has_wind: bool,
}

impl ObservationTable {
    pub fn new(country: impl Into<String>, rows: Vec<Observation>, has_wind: bool) -> Self {
        Self {
            country: country.into(),
            rows,
            has_wind,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        !metric.is_wind() || self.has_wind
    }

    /// Non-missing values of a metric, in row order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.get(metric)).collect()
    }
}

/// Row-union of several observation tables, held by reference.
#[derive(Debug, Clone, Default)]
pub struct CombinedTable {
    tables: Vec<Arc<ObservationTable>>,
}

impl CombinedTable {
    pub fn new(tables: impl IntoIterator<Item = Arc<ObservationTable>>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn tables(&self) -> &[Arc<ObservationTable>] {
        &self.tables
    }

    /// Every row, tagged with its country.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Observation)> + '_ {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter().map(move |r| (t.country.as_str(), r)))
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for m in Metric::REQUIRED.iter().chain(Metric::WIND.iter()) {
            assert_eq!(m.column().parse::<Metric>().unwrap(), *m);
        }
        assert_eq!(
            "ghi".parse::<Metric>(),
            Err(UnknownMetric("ghi".to_string()))
        );
    }

    #[test]
    fn nan_cells_are_stored_as_missing() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut obs = Observation::at(ts);
        obs.set(Metric::Ghi, Some(f64::NAN));
        assert_eq!(obs.get(Metric::Ghi), None);
    }

    #[test]
    fn wind_metrics_require_wind_columns() {
        let table = ObservationTable::new("Benin", Vec::new(), false);
        assert!(table.has_metric(Metric::Ghi));
        assert!(!table.has_metric(Metric::Ws));
    }
}
