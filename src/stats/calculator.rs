//! Statistics Calculator Module
//! Descriptive statistics per country and boxplot summaries.
//!
//! Missing values never reach this module: callers pass only the non-missing samples, so every
//! statistic here is computed over present values only.

use statrs::statistics::{Data, Median, Statistics};

/// Descriptive statistics for a single group (country).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub group_name: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl GroupStats {
    /// True when every statistic is a finite number.
    pub fn is_defined(&self) -> bool {
        [self.mean, self.median, self.std, self.min, self.max]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Five-number summary plus mean, as drawn by a boxplot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub mean: f64,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    ///
    /// Empty input yields NaN everywhere; a single value has an undefined (NaN) std.
    pub fn compute_descriptive_stats(values: &[f64]) -> GroupStats {
        if values.is_empty() {
            return GroupStats::default();
        }

        let median = Data::new(values.to_vec()).median();

        GroupStats {
            group_name: String::new(),
            count: values.len(),
            mean: Statistics::mean(values),
            median,
            std: Statistics::std_dev(values),
            min: Statistics::min(values),
            max: Statistics::max(values),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Boxplot summary with whiskers at the furthest points within 1.5 IQR.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - 1.5 * iqr)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + 1.5 * iqr)
            .unwrap_or(q3);

        Some(BoxSummary {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
            mean: values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}
