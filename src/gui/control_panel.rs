//! Control Panel Widget
//! Left side panel: application overview, data source, country selection and export.

use crate::selector::CountrySelector;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Actions emitted by the control panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    CountryChanged(String),
    Export,
}

const OVERVIEW: [(&str, &str); 7] = [
    ("Unique Countries", "List of countries analyzed."),
    ("Year Range", "Minimum and maximum years in the dataset."),
    ("Summary Statistics", "Overview of the dataset."),
    ("Missing Values", "Count of missing values in each column."),
    ("Shape Information", "Number of rows and columns in the dataset."),
    ("Top & Lowest Countries", "Countries with the most and least suicides."),
    ("Visualizations", "Various plots depicting data insights."),
];

/// Left side control panel with file selection and the country selector.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub status: String,
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            status: "Ready".to_string(),
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, selector: Option<&CountrySelector>) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Suicide Data Analysis")
                    .size(22.0)
                    .color(Color32::from_rgb(0, 123, 255)),
            );
        });
        ui.add_space(10.0);
        ui.separator();

        // ===== Overview Section =====
        ui.label(RichText::new("Overview of the Application").size(14.0).strong());
        ui.add_space(5.0);
        for (name, text) in OVERVIEW {
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(format!("• {name}:")).strong());
                ui.label(text);
            });
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(!self.busy, egui::Button::new("📂 Browse"))
                            .clicked()
                        {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.separator();

        // ===== Country Section =====
        ui.label(RichText::new("Choose a country:").size(14.0).strong());
        ui.add_space(5.0);

        let countries = selector.map(CountrySelector::countries).unwrap_or_default();
        let selected = selector.and_then(CountrySelector::selected).unwrap_or("").to_string();
        ComboBox::from_id_salt("country")
            .width(220.0)
            .selected_text(&selected)
            .show_ui(ui, |ui| {
                for country in countries {
                    if ui
                        .selectable_label(selected == *country, country)
                        .clicked()
                        && selected != *country
                    {
                        action = ControlPanelAction::CountryChanged(country.clone());
                    }
                }
            });

        ui.add_space(10.0);
        ui.separator();

        ui.vertical_centered(|ui| {
            if ui
                .add_enabled(!self.busy, egui::Button::new("💾 Export Charts"))
                .clicked()
            {
                action = ControlPanelAction::Export;
            }
        });

        ui.add_space(10.0);
        if self.busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(&self.status);
            });
        } else {
            ui.label(RichText::new(&self.status).color(Color32::GRAY));
        }

        action
    }
}
