//! Chart Viewer Widget
//! Central scrollable panel showing the distribution, summary, time series and wind sections.

use crate::charts::ChartPlotter;
use egui::{Color32, RichText, ScrollArea};
use solar_dashboard::DashboardView;

const SECTION_SPACING: f32 = 18.0;

/// Scrollable dashboard display.
#[derive(Default)]
pub struct ChartViewer {
    pub view: Option<DashboardView>,
    /// Shown instead of the charts, e.g. when no selected country has data.
    pub warning: Option<String>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(&mut self, view: DashboardView) {
        self.view = Some(view);
        self.warning = None;
    }

    /// Replace the charts with a warning until the next successful run.
    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.view = None;
        self.warning = Some(message.into());
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.add_space(SECTION_SPACING);
        ui.label(RichText::new(title).size(20.0).strong());
        ui.separator();
    }

    fn subsection(ui: &mut egui::Ui, title: &str) {
        ui.add_space(8.0);
        ui.label(RichText::new(title).size(15.0).strong());
        ui.add_space(4.0);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("🌞 Solar Potential Comparison Dashboard")
                .size(26.0)
                .strong(),
        );
        ui.label(
            RichText::new("Compare solar radiation metrics across different countries")
                .color(Color32::GRAY),
        );

        if let Some(warning) = &self.warning {
            ui.add_space(SECTION_SPACING);
            egui::Frame::none()
                .fill(Color32::from_rgb(255, 243, 205))
                .rounding(5.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(format!("⚠ {warning}"))
                            .color(Color32::from_rgb(133, 100, 4)),
                    );
                });
            return;
        }

        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Loading...").size(20.0));
            });
            return;
        };

        let metric = view.summary.metric;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::section(ui, &format!("{metric} Comparison Across Countries"));
                ui.label(RichText::new(metric.description()).color(Color32::GRAY));

                Self::subsection(ui, "Distribution Comparison");
                ui.label(format!("{metric} Distribution by Country"));
                ChartPlotter::draw_boxplot_chart(ui, metric.column(), &view.distributions);

                Self::subsection(ui, "Statistical Summary");
                ChartPlotter::draw_stats_table(ui, &view.summary);

                Self::section(ui, "Time Series Analysis");
                match &view.daily {
                    Some(series) if !series.points.is_empty() => {
                        ui.label(format!("Daily Average {metric} for {}", series.country));
                        ChartPlotter::draw_daily_chart(ui, metric.column(), series);
                    }
                    Some(series) => {
                        ui.label(format!("No {metric} values recorded for {}", series.country));
                    }
                    None => {
                        ui.label("Select a country with data for the time series.");
                    }
                }

                if view.wind_available {
                    Self::section(ui, "Wind Analysis");
                    match &view.wind {
                        Some(wind) if !wind.rose.is_empty() => {
                            ui.label(format!("Wind Direction/Speed for {}", wind.country));
                            ChartPlotter::draw_wind_rose(ui, wind);
                        }
                        Some(wind) => {
                            ui.label(format!("No wind observations for {}", wind.country));
                        }
                        None => {
                            ui.label("The selected country has no wind measurements.");
                        }
                    }
                }

                Self::section(ui, "Insights");
                for line in [
                    "Compare solar radiation metrics (GHI, DNI, DHI) across countries",
                    "Examine distributions using boxplots",
                    "View time series trends for each country",
                    "Analyze wind patterns where available",
                ] {
                    ui.label(format!("• {line}"));
                }
                ui.add_space(SECTION_SPACING);
            });
    }
}
