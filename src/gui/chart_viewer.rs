//! Chart Viewer Widget
//! Right side scrollable panel showing every report section as a card.

use crate::charts::ChartPlotter;
use crate::report::{Report, Section};
use egui::{RichText, ScrollArea};

/// Chart card configuration
const CHART_SPACING: f32 = 15.0;
const CARD_WIDTH: f32 = 900.0;

#[derive(Default)]
pub struct ChartViewer;

impl ChartViewer {
    pub fn new() -> Self {
        Self
    }

    /// Draw all report sections in display order
    pub fn show(&mut self, ui: &mut egui::Ui, report: Option<&Report>) {
        let Some(report) = report else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, section) in report.sections.iter().enumerate() {
                    Self::draw_card(ui, idx, section);
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    fn draw_card(ui: &mut egui::Ui, idx: usize, section: &Section) {
        let card_width = CARD_WIDTH.min(ui.available_width() - 20.0);

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(card_width);
                ui.label(
                    RichText::new(&section.title)
                        .size(18.0)
                        .strong()
                        .color(egui::Color32::from_rgb(0, 123, 255)),
                );
                ui.add_space(8.0);
                ChartPlotter::draw_figure(ui, &format!("{idx}_{}", section.title), &section.figure);
            });
    }
}
