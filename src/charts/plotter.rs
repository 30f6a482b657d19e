//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use chrono::{Datelike, NaiveDate};
use egui::{Color32, RichText};
use egui_plot::{
    BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};
use solar_dashboard::pipeline::{CountryWind, DailySeries};
use solar_dashboard::stats::{
    sector_center_degrees, GroupStats, StatsCalculator, SummaryTable, SECTOR_COUNT,
    SECTOR_WIDTH_DEG,
};
use std::collections::BTreeMap;

pub const PALETTE: [Color32; 8] = [
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(121, 85, 72),  // Brown
];

const WIND_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

/// Points along each wedge arc.
const ARC_STEPS: usize = 8;

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn get_country_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Calculate beeswarm positions for points with duplicate values.
    pub fn beeswarm_positions(y_values: &[f64], center: f64, width: f64) -> Vec<f64> {
        let n = y_values.len();
        if n == 0 {
            return Vec::new();
        }

        let mut positions = vec![center; n];

        // Round values and find duplicates
        let precision = 1e6;
        let mut value_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();

        for (i, &y) in y_values.iter().enumerate() {
            let key = (y * precision).round() as i64;
            value_indices.entry(key).or_default().push(i);
        }

        for indices in value_indices.values() {
            if indices.len() > 1 {
                let step = width / (indices.len() - 1) as f64;
                let start = center - width / 2.0;

                for (i, &idx) in indices.iter().enumerate() {
                    positions[idx] = start + i as f64 * step;
                }
            }
        }

        positions
    }

    /// Boxplot per country, x-axis: countries, y-axis: metric value.
    pub fn draw_boxplot_chart(
        ui: &mut egui::Ui,
        metric: &str,
        distributions: &BTreeMap<String, Vec<f64>>,
    ) {
        let countries: Vec<String> = distributions.keys().cloned().collect();
        let x_labels = countries.clone();

        Plot::new(format!("boxplot_{metric}"))
            .height(320.0)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Country")
            .y_axis_label(format!("{metric} Value"))
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (idx - mark.value).abs() < 1e-6 {
                    x_labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                let mut means: Vec<[f64; 2]> = Vec::new();

                for (i, country) in countries.iter().enumerate() {
                    let values = &distributions[country];
                    let Some(summary) = StatsCalculator::box_summary(values) else {
                        continue;
                    };
                    let color = Self::get_country_color(i);
                    let x = i as f64;
                    means.push([x, summary.mean]);

                    let box_elem = BoxElem::new(
                        x,
                        BoxSpread::new(
                            summary.whisker_low,
                            summary.q1,
                            summary.median,
                            summary.q3,
                            summary.whisker_high,
                        ),
                    )
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.3))
                    .stroke(egui::Stroke::new(1.5, color));

                    plot_ui.box_plot(BoxPlot::new(vec![box_elem]).name(country));

                    // Outliers only; the box covers the rest.
                    let outliers: Vec<f64> = values
                        .iter()
                        .copied()
                        .filter(|&v| v < summary.whisker_low || v > summary.whisker_high)
                        .collect();
                    if !outliers.is_empty() {
                        let xs = Self::beeswarm_positions(&outliers, x, 0.3);
                        let points: PlotPoints = xs
                            .iter()
                            .zip(outliers.iter())
                            .map(|(&x, &y)| [x, y])
                            .collect();
                        plot_ui.points(
                            Points::new(points)
                                .radius(2.0)
                                .color(color.gamma_multiply(0.7)),
                        );
                    }
                }

                if means.len() > 1 {
                    plot_ui.line(
                        Line::new(PlotPoints::from(means))
                            .color(Color32::GRAY)
                            .width(1.5)
                            .name("Mean"),
                    );
                }
            });
    }

    /// Daily average line chart. X values are days since the common era.
    pub fn draw_daily_chart(ui: &mut egui::Ui, metric: &str, series: &DailySeries) {
        let points: PlotPoints = series
            .points
            .iter()
            .map(|p| [p.date.num_days_from_ce() as f64, p.value])
            .collect();

        Plot::new(format!("daily_{}_{metric}", series.country))
            .height(300.0)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label(format!("{metric} Value"))
            .x_axis_formatter(|mark, _range| {
                NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .label_formatter(|_name, value| {
                let date = NaiveDate::from_num_days_from_ce_opt(value.x.round() as i32)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                format!("{date}\n{:.2}", value.y)
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(points)
                        .color(PALETTE[0])
                        .width(2.0)
                        .name(format!("Daily Average {metric}")),
                );
            });
    }

    /// Compass position of a point at `radius` and `angle_deg` (0 = north, clockwise).
    fn polar(radius: f64, angle_deg: f64) -> [f64; 2] {
        let theta = angle_deg.to_radians();
        [radius * theta.sin(), radius * theta.cos()]
    }

    /// One wedge per sector, centered on the sector's angle, length = mean wind speed.
    pub fn draw_wind_rose(ui: &mut egui::Ui, wind: &CountryWind) {
        let max_speed = wind.rose.max_speed().unwrap_or(1.0).max(f64::EPSILON);

        Plot::new(format!("wind_{}", wind.country))
            .height(420.0)
            .width(420.0)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                // Speed rings
                for ring in 1..=4 {
                    let r = max_speed * ring as f64 / 4.0;
                    let circle: PlotPoints = (0..=72)
                        .map(|i| Self::polar(r, i as f64 * 5.0))
                        .collect();
                    plot_ui.line(Line::new(circle).color(Color32::GRAY).width(0.5));
                    plot_ui.text(
                        Text::new(PlotPoint::new(r * 0.05, r), format!("{r:.1}"))
                            .color(Color32::GRAY),
                    );
                }

                for (label, angle) in [("N", 0.0), ("E", 90.0), ("S", 180.0), ("W", 270.0)] {
                    let [x, y] = Self::polar(max_speed * 1.12, angle);
                    plot_ui.text(Text::new(PlotPoint::new(x, y), RichText::new(label).strong()));
                }

                let half = SECTOR_WIDTH_DEG / 2.0;
                for sector in 0..SECTOR_COUNT {
                    let Some(speed) = wind.rose.get(sector) else {
                        continue;
                    };
                    let center = sector_center_degrees(sector);
                    let mut wedge = vec![[0.0, 0.0]];
                    wedge.extend((0..=ARC_STEPS).map(|step| {
                        let angle = center - half + SECTOR_WIDTH_DEG * step as f64 / ARC_STEPS as f64;
                        Self::polar(speed, angle)
                    }));

                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(wedge))
                            .fill_color(WIND_COLOR.gamma_multiply(0.6))
                            .stroke(egui::Stroke::new(1.0, WIND_COLOR))
                            .name(format!("{center:.1}°: {speed:.2}")),
                    );
                }
            });
    }

    fn format_stat(value: f64) -> String {
        if value.is_finite() {
            format!("{value:.2}")
        } else {
            "-".to_string()
        }
    }

    /// Light yellow to brown, for `t` in 0..=1.
    fn gradient(t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0) as f32;
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color32::from_rgb(lerp(255, 153), lerp(247, 52), lerp(188, 4))
    }

    fn stat_cell(ui: &mut egui::Ui, value: f64, range: Option<(f64, f64)>) {
        let mut text = RichText::new(Self::format_stat(value)).size(12.0);
        if let Some((lo, hi)) = range.filter(|_| value.is_finite()) {
            let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
            let fill = Self::gradient(t);
            let ink = if t > 0.6 { Color32::WHITE } else { Color32::BLACK };
            text = text.background_color(fill).color(ink);
        }
        ui.label(text);
    }

    /// Min and max of one column over the defined rows.
    fn column_range(rows: &[GroupStats], pick: fn(&GroupStats) -> f64) -> Option<(f64, f64)> {
        rows.iter()
            .map(pick)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Summary statistics table, each column shaded from its lowest to its highest value.
    pub fn draw_stats_table(ui: &mut egui::Ui, summary: &SummaryTable) {
        let columns: [(&str, fn(&GroupStats) -> f64); 5] = [
            ("Mean", |s| s.mean),
            ("Median", |s| s.median),
            ("Std", |s| s.std),
            ("Min", |s| s.min),
            ("Max", |s| s.max),
        ];
        let ranges: Vec<Option<(f64, f64)>> = columns
            .iter()
            .map(|(_, pick)| Self::column_range(&summary.rows, *pick))
            .collect();

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("stats_table_{}", summary.metric)))
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Country").strong());
                        ui.label(RichText::new("N").strong());
                        for (name, _) in &columns {
                            ui.label(RichText::new(*name).strong());
                        }
                        ui.end_row();

                        for row in &summary.rows {
                            ui.label(RichText::new(&row.group_name).size(12.0));
                            ui.label(RichText::new(row.count.to_string()).size(12.0));
                            for ((_, pick), range) in columns.iter().zip(&ranges) {
                                Self::stat_cell(ui, pick(row), *range);
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}
