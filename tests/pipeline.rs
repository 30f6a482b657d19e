use chrono::NaiveDate;
use solar_dashboard::data::{CombinedTable, CsvSource, DatasetLoader};
use solar_dashboard::stats::{daily_average, summarize, wind_rose};
use solar_dashboard::{build_view, DashboardConfig, PipelineError, Selection};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Ten rows spread over 2024-01-01..=2024-01-03 (4 + 3 + 3).
fn write_country(dir: &Path, country: &str, base_ghi: f64) {
    let hours: [(u32, u32); 10] = [
        (1, 0),
        (1, 6),
        (1, 12),
        (1, 18),
        (2, 0),
        (2, 8),
        (2, 16),
        (3, 4),
        (3, 10),
        (3, 22),
    ];

    let mut csv = String::from("Timestamp,GHI,DNI,DHI,Tamb,RH,WS,WD\n");
    for (i, (day, hour)) in hours.iter().enumerate() {
        writeln!(
            csv,
            "2024-01-{day:02} {hour:02}:00,{},{},{},{},{},{},{}",
            base_ghi + i as f64,
            100.0,
            50.0,
            25.0 + i as f64 / 10.0,
            70.0,
            1.0 + i as f64,
            i as f64 * 36.0,
        )
        .unwrap();
    }

    let file = dir.join(format!("{}_clean.csv", country.to_lowercase()));
    fs::write(file, csv).unwrap();
}

fn loader_for(dir: &Path) -> DatasetLoader {
    DatasetLoader::new(CsvSource::new(dir, "_clean.csv"))
}

#[test]
fn two_countries_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_country(dir.path(), "Benin", 100.0);
    write_country(dir.path(), "Togo", 200.0);

    let loader = loader_for(dir.path());
    let data = loader.load_many(["Benin", "Togo"]);
    assert_eq!(data.len(), 2);
    assert!(data.values().all(|t| t.len() == 10));

    let combined = CombinedTable::new(data.values().cloned());
    let summary = summarize(&combined, "GHI").unwrap();
    assert_eq!(summary.rows.len(), 2);
    for row in &summary.rows {
        assert!(row.is_defined());
        assert!(row.min <= row.mean && row.mean <= row.max);
    }
    assert_eq!(summary.get("Togo").unwrap().min, 200.0);

    let points = daily_average(&data["Benin"], "GHI").unwrap();
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        ]
    );
    // Day one holds GHI 100, 101, 102, 103.
    assert_eq!(points[0].value, 101.5);

    // WD steps by 36 degrees, so every row lands in its own sector.
    let rose = wind_rose(&data["Benin"]);
    assert_eq!(rose.sectors.len(), 10);
    assert_eq!(rose.get(8), Some(6.0));
    assert!(rose.sectors.keys().all(|&s| s < 16));
}

#[test]
fn absent_country_is_omitted() {
    let dir = TempDir::new().unwrap();
    write_country(dir.path(), "Benin", 100.0);

    let loader = loader_for(dir.path());
    let data = loader.load_many(["Benin", "Sierra Leone"]);
    assert_eq!(data.len(), 1);
    assert!(loader.load("Sierra Leone").unwrap().is_none());
}

#[test]
fn dashboard_view_from_files() {
    let dir = TempDir::new().unwrap();
    write_country(dir.path(), "Benin", 100.0);
    write_country(dir.path(), "Sierra Leone", 300.0);

    let config = DashboardConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let loader = DatasetLoader::from_config(&config);
    let selection = Selection {
        countries: config.countries.clone(),
        metric: "GHI".to_string(),
        time_series_country: Some("Sierra Leone".to_string()),
        wind_country: Some("Benin".to_string()),
    };

    let view = build_view(&loader, &selection).unwrap();
    assert_eq!(view.countries, vec!["Benin", "Sierra Leone"]);
    assert_eq!(view.daily.unwrap().points.len(), 3);
    assert!(view.wind_available);
    assert!(!view.wind.unwrap().rose.is_empty());
    assert_eq!(view.distributions["Benin"].len(), 10);

    // Same answer from cache.
    let again = build_view(&loader, &selection).unwrap();
    assert_eq!(again.summary, view.summary);
}

#[test]
fn empty_data_dir_reports_no_data() {
    let dir = TempDir::new().unwrap();
    let loader = loader_for(dir.path());
    let selection = Selection {
        countries: vec!["Benin".to_string(), "Togo".to_string()],
        metric: "GHI".to_string(),
        ..Default::default()
    };

    assert_eq!(build_view(&loader, &selection), Err(PipelineError::NoData));
}
