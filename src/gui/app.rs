//! Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Loading result from background thread
enum LoadResult {
    Complete(Box<Dashboard>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    dashboard: Option<Dashboard>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    load_error: Option<String>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            config,
            dashboard: None,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
            load_error: None,
        };
        let source = app.config.source_path.clone();
        app.start_loading(source);
        app
    }

    /// Load, clean and aggregate in a background thread.
    fn start_loading(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }

        self.config.source_path = path.clone();
        self.control_panel.csv_path = Some(path);
        self.control_panel.set_status("Loading data...");
        self.control_panel.busy = true;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let config = self.config.clone();
        thread::spawn(move || {
            let result = match Dashboard::load(&config) {
                Ok(dashboard) => LoadResult::Complete(Box::new(dashboard)),
                Err(e) => LoadResult::Error(format!("{e:#}")),
            };
            let _ = tx.send(result);
        });
    }

    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dashboard)) => {
                let table = &dashboard.table;
                self.control_panel.set_status(&format!(
                    "Loaded {} rows, {} columns",
                    table.height(),
                    table.width()
                ));
                self.config.country = dashboard.selector.selected().map(str::to_string);
                self.dashboard = Some(*dashboard);
                self.finish_loading();
            }
            Ok(LoadResult::Error(error)) => {
                log::error!("{error}");
                self.control_panel.set_status("Load failed");
                self.load_error = Some(error);
                self.finish_loading();
            }
            Err(_) => self.load_rx = Some(rx),
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    fn handle_country_changed(&mut self, country: &str) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        match dashboard.choose_country(country) {
            Ok(()) => {
                self.config.country = Some(country.to_string());
                self.control_panel.set_status(&format!("Showing {country}"));
            }
            Err(e) => {
                log::warn!("{e:#}");
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }

    /// Export every chart as PNG plus the JSON and text report.
    fn handle_export(&mut self) {
        let Some(dashboard) = &self.dashboard else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = &self.config.export_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(dir) = dialog.pick_folder() else {
            return;
        };

        match StaticChartRenderer::export_report(&dashboard.report, &dir) {
            Ok(files) => {
                self.control_panel.set_status(&format!(
                    "Exported {} files to {}",
                    files.len(),
                    dir.display()
                ));
                self.config.export_dir = Some(dir);
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.control_panel.set_status(&format!("Export error: {e}"));
            }
        }
    }

    /// Blocking message for a failed load; the dashboard stays empty until dismissed.
    fn show_load_error(&mut self, ctx: &egui::Context) {
        let Some(error) = self.load_error.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Failed to load data")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&error);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Browse...").clicked() {
                        dismissed = true;
                        self.handle_browse_csv();
                    }
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.load_error = None;
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        if self.load_error.is_some() {
            self.show_load_error(ctx);
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(self.load_error.is_none(), |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let selector = self.dashboard.as_ref().map(|d| &d.selector);
                        let action = self.control_panel.show(ui, selector);

                        match action {
                            ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                            ControlPanelAction::CountryChanged(country) => {
                                self.handle_country_changed(&country)
                            }
                            ControlPanelAction::Export => self.handle_export(),
                            ControlPanelAction::None => {}
                        }
                    });
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            let report = self.dashboard.as_ref().map(|d| &d.report);
            self.chart_viewer.show(ui, report);
        });
    }
}
