//! Control Panel Widget
//! Left side panel with the data folder, country and metric selections.

use egui::{Color32, ComboBox, RichText};
use solar_dashboard::data::Metric;
use solar_dashboard::Selection;
use std::path::PathBuf;

/// User selections driving the dashboard
#[derive(Clone)]
pub struct UserSettings {
    pub data_dir: PathBuf,
    /// Parallel to `ControlPanel::countries`.
    pub selected: Vec<bool>,
    pub metric: Metric,
    pub time_series_country: String,
    pub wind_country: String,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub countries: Vec<String>,
    pub wind_available: bool,
    pub status: String,
    pub busy: bool,
}

impl ControlPanel {
    /// All countries start selected.
    pub fn new(data_dir: PathBuf, countries: Vec<String>) -> Self {
        let first = countries.first().cloned().unwrap_or_default();
        Self {
            settings: UserSettings {
                data_dir,
                selected: vec![true; countries.len()],
                metric: Metric::Ghi,
                time_series_country: first.clone(),
                wind_country: first,
            },
            countries,
            wind_available: false,
            status: "Ready".to_string(),
            busy: false,
        }
    }

    pub fn selected_countries(&self) -> Vec<String> {
        self.countries
            .iter()
            .zip(self.settings.selected.iter())
            .filter(|(_, &selected)| selected)
            .map(|(country, _)| country.clone())
            .collect()
    }

    /// Current selection in the form the pipeline takes.
    pub fn selection(&self) -> Selection {
        let selected = self.selected_countries();
        let pick = |preferred: &str| {
            if selected.iter().any(|c| c == preferred) {
                Some(preferred.to_string())
            } else {
                selected.first().cloned()
            }
        };

        Selection {
            metric: self.settings.metric.column().to_string(),
            time_series_country: pick(&self.settings.time_series_country),
            wind_country: pick(&self.settings.wind_country),
            countries: selected.clone(),
        }
    }

    fn country_combo(
        ui: &mut egui::Ui,
        id: &str,
        label: &str,
        current: &mut String,
        options: &[String],
    ) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new(label));
            ComboBox::from_id_salt(id)
                .width(150.0)
                .selected_text(current.as_str())
                .show_ui(ui, |ui| {
                    for option in options {
                        if ui
                            .selectable_label(*current == *option, option)
                            .clicked()
                        {
                            *current = option.clone();
                            changed = true;
                        }
                    }
                });
        });
        changed
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌞 Solar Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(243, 156, 18)),
            );
        });
        ui.add_space(10.0);
        ui.separator();

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(self.settings.data_dir.display().to_string()).size(12.0),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseDataDir;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.separator();

        // ===== Filters =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(5.0);
        ui.label("Select countries to compare");
        let toggles = self.countries.iter().zip(self.settings.selected.iter_mut());
        for (country, selected) in toggles {
            if ui.checkbox(selected, country).changed() {
                action = ControlPanelAction::SelectionChanged;
            }
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new("Solar metric:"));
            ComboBox::from_id_salt("metric")
                .width(150.0)
                .selected_text(self.settings.metric.column())
                .show_ui(ui, |ui| {
                    for metric in Metric::REQUIRED {
                        if ui
                            .selectable_value(&mut self.settings.metric, metric, metric.column())
                            .on_hover_text(metric.description())
                            .changed()
                        {
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
        });

        let selected = self.selected_countries();
        ui.add_space(5.0);
        if Self::country_combo(
            ui,
            "time_series_country",
            "Time series:",
            &mut self.settings.time_series_country,
            &selected,
        ) {
            action = ControlPanelAction::SelectionChanged;
        }

        if self.wind_available {
            ui.add_space(5.0);
            if Self::country_combo(
                ui,
                "wind_country",
                "Wind analysis:",
                &mut self.settings.wind_country,
                &selected,
            ) {
                action = ControlPanelAction::SelectionChanged;
            }
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Status =====
        ui.horizontal(|ui| {
            if self.busy {
                ui.spinner();
            }
            let color = if self.status.starts_with("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(color));
        });

        action
    }

    pub fn set_status(&mut self, busy: bool, status: &str) {
        self.busy = busy;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseDataDir,
    SelectionChanged,
}
