//! Solar Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use solar_dashboard::data::DatasetLoader;
use solar_dashboard::{build_view, DashboardConfig, DashboardView, PipelineError, Selection};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{error, warn};

/// Calculation result from background thread
enum CalcResult {
    Complete(Box<DashboardView>),
    NoData,
    Error(String),
}

/// Main application window.
pub struct SolarDashboardApp {
    config: DashboardConfig,
    loader: Arc<DatasetLoader>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async calculation
    calc_rx: Option<Receiver<CalcResult>>,
    is_calculating: bool,
    /// Selection changed while a run was in flight.
    rerun_requested: bool,
}

impl SolarDashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let loader = Arc::new(DatasetLoader::from_config(&config));
        let control_panel = ControlPanel::new(config.data_dir.clone(), config.countries.clone());

        let mut app = Self {
            config,
            loader,
            control_panel,
            chart_viewer: ChartViewer::new(),
            calc_rx: None,
            is_calculating: false,
            rerun_requested: false,
        };
        app.start_calculation();
        app
    }

    /// Pick another data folder. Starts from an empty cache.
    fn handle_browse_data_dir(&mut self) {
        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        else {
            return; // User cancelled
        };

        self.config.data_dir = dir.clone();
        self.control_panel.settings.data_dir = dir;
        self.loader = Arc::new(DatasetLoader::from_config(&self.config));
        self.request_calculation();
    }

    fn request_calculation(&mut self) {
        if self.is_calculating {
            self.rerun_requested = true;
        } else {
            self.start_calculation();
        }
    }

    /// Start calculation in background thread
    fn start_calculation(&mut self) {
        let selection = self.control_panel.selection();
        let loader = Arc::clone(&self.loader);

        let (tx, rx) = channel();
        self.calc_rx = Some(rx);
        self.is_calculating = true;
        self.rerun_requested = false;
        self.control_panel.set_status(true, "Loading data...");

        thread::spawn(move || Self::run_calculation(tx, loader, selection));
    }

    /// Run calculation (called from background thread)
    fn run_calculation(tx: Sender<CalcResult>, loader: Arc<DatasetLoader>, selection: Selection) {
        let result = match build_view(&*loader, &selection) {
            Ok(view) => CalcResult::Complete(Box::new(view)),
            Err(PipelineError::NoData) => CalcResult::NoData,
            Err(e) => {
                error!(error = %e, "dashboard calculation failed");
                CalcResult::Error(e.to_string())
            }
        };
        let _ = tx.send(result);
    }

    /// Check for calculation results
    fn check_calculation_results(&mut self) {
        let Some(rx) = self.calc_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(CalcResult::Complete(view)) => {
                let requested = self.control_panel.selected_countries().len();
                self.control_panel.wind_available = view.wind_available;
                self.control_panel.set_status(
                    false,
                    &format!("Loaded {} of {requested} countries", view.countries.len()),
                );
                self.chart_viewer.set_view(*view);
            }
            Ok(CalcResult::NoData) => {
                warn!("no data available for the selected countries");
                self.control_panel.wind_available = false;
                self.control_panel.set_status(false, "No data");
                self.chart_viewer.set_warning(
                    "No data available for selected countries. \
                     Please check if clean data files exist.",
                );
            }
            Ok(CalcResult::Error(message)) => {
                self.control_panel
                    .set_status(false, &format!("Error: {message}"));
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.calc_rx = Some(rx);
                return;
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_status(false, "Error: calculation thread stopped");
            }
        }

        self.is_calculating = false;
        if self.rerun_requested {
            self.start_calculation();
        }
    }
}

impl eframe::App for SolarDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_calculation_results();

        // Request repaint while calculating
        if self.is_calculating {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseDataDir => self.handle_browse_data_dir(),
                        ControlPanelAction::SelectionChanged => self.request_calculation(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
