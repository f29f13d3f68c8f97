//! Chart Plotter Module
//! Draws report figures interactively using egui_plot.

use crate::report::Figure;
use crate::stats::{Aggregate, ColumnSummary, CorrelationMatrix, Pivot, SexHistogram};
use egui::{Align2, Color32, FontId, RichText, Sense};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points, Polygon};

/// Color palette for series (female, male, then the rest)
pub const PALETTE: [Color32; 6] = [
    Color32::from_rgb(255, 105, 180), // Pink
    Color32::from_rgb(0, 0, 128),     // Navy
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(26, 188, 156),  // Teal
];

pub const BAR_COLOR: Color32 = Color32::from_rgb(214, 39, 40);
pub const AGE_COLOR: Color32 = Color32::from_rgb(135, 206, 235);
pub const AREA_COLOR: Color32 = Color32::from_rgb(29, 53, 87);

const PLOT_HEIGHT: f32 = 320.0;

/// Creates dashboard visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw any figure; `id` keeps plot state apart between sections.
    pub fn draw_figure(ui: &mut egui::Ui, id: &str, figure: &Figure) {
        match figure {
            Figure::KeyValues(pairs) => Self::draw_key_values(ui, id, pairs),
            Figure::Summary(rows) => Self::draw_summary_table(ui, id, rows),
            Figure::Bar {
                aggregate,
                horizontal,
            } => Self::draw_bar_chart(ui, id, aggregate, *horizontal),
            Figure::Donut(aggregate) => Self::draw_donut(ui, id, aggregate),
            Figure::Area(aggregate) => Self::draw_area_chart(ui, id, aggregate),
            Figure::Line(aggregate) => Self::draw_line_chart(ui, id, aggregate),
            Figure::GroupedBar(aggregate) => Self::draw_grouped_bars(ui, id, aggregate),
            Figure::Heatmap(pivot) => Self::draw_pivot(ui, pivot),
            Figure::Histogram(histograms) => Self::draw_histograms(ui, id, histograms),
            Figure::Correlation(matrix) => Self::draw_correlation(ui, matrix),
            Figure::Notice(message) => {
                ui.label(RichText::new(message).size(14.0).italics());
            }
        }
    }

    fn draw_key_values(ui: &mut egui::Ui, id: &str, pairs: &[(String, String)]) {
        egui::Grid::new(ui.make_persistent_id(format!("kv_{id}")))
            .striped(true)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for (key, value) in pairs {
                    ui.label(RichText::new(key).strong());
                    ui.label(value);
                    ui.end_row();
                }
            });
    }

    /// Draw statistics table
    fn draw_summary_table(ui: &mut egui::Ui, id: &str, rows: &[ColumnSummary]) {
        egui::Grid::new(ui.make_persistent_id(format!("summary_{id}")))
            .striped(true)
            .min_col_width(55.0)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                for header in ["Column", "N", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"] {
                    ui.label(RichText::new(header).strong().size(11.0));
                }
                ui.end_row();

                for s in rows {
                    ui.label(RichText::new(&s.column).size(11.0));
                    ui.label(RichText::new(s.count.to_string()).size(11.0));
                    for v in [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max] {
                        ui.label(RichText::new(format!("{v:.3}")).size(11.0));
                    }
                    ui.end_row();
                }
            });
    }

    /// Category axis formatter: labels at integer positions only.
    fn category_formatter(
        labels: Vec<String>,
    ) -> impl Fn(egui_plot::GridMark, &std::ops::RangeInclusive<f64>) -> String {
        move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        }
    }

    fn draw_bar_chart(ui: &mut egui::Ui, id: &str, aggregate: &Aggregate, horizontal: bool) {
        let labels = aggregate.labels();
        let bars: Vec<Bar> = aggregate
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Bar::new(i as f64, row.value)
                    .width(0.7)
                    .name(row.keys.join(" / "))
            })
            .collect();

        let color = if horizontal { AGE_COLOR } else { BAR_COLOR };
        let mut chart = BarChart::new(bars)
            .color(color)
            .name(aggregate.value_column.as_str());
        if horizontal {
            chart = chart.horizontal();
        }

        let plot = Plot::new(format!("bar_{id}"))
            .height(PLOT_HEIGHT)
            .allow_scroll(false);
        let plot = if horizontal {
            plot.y_axis_formatter(Self::category_formatter(labels))
                .x_axis_label(aggregate.value_column.as_str())
        } else {
            plot.x_axis_formatter(Self::category_formatter(labels))
                .y_axis_label(aggregate.value_column.as_str())
        };

        plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
    }

    fn draw_line_chart(ui: &mut egui::Ui, id: &str, aggregate: &Aggregate) {
        let points: Vec<[f64; 2]> = aggregate
            .rows
            .iter()
            .filter_map(|r| Some([r.keys.first()?.parse::<f64>().ok()?, r.value]))
            .collect();

        Plot::new(format!("line_{id}"))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("year")
            .y_axis_label(aggregate.value_column.as_str())
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(BAR_COLOR)
                        .width(2.0)
                        .name(aggregate.value_column.as_str()),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(3.0)
                        .color(BAR_COLOR),
                );
            });
    }

    fn draw_area_chart(ui: &mut egui::Ui, id: &str, aggregate: &Aggregate) {
        let points: Vec<[f64; 2]> = aggregate
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, v)| [i as f64, v])
            .collect();

        Plot::new(format!("area_{id}"))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .x_axis_formatter(Self::category_formatter(aggregate.labels()))
            .y_axis_label("Total Number of Suicidal Cases")
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(AREA_COLOR)
                        .fill(0.0)
                        .width(2.0),
                );
            });
    }

    /// One bar per (row key, column key), grouped by the row key.
    fn draw_grouped_bars(ui: &mut egui::Ui, id: &str, aggregate: &Aggregate) {
        let pivot = Pivot::from_aggregate(aggregate);
        let band = 0.8 / pivot.columns.len().max(1) as f64;

        Plot::new(format!("grouped_{id}"))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_formatter(Self::category_formatter(pivot.rows.clone()))
            .y_axis_label("Total Suicidal Cases")
            .show(ui, |plot_ui| {
                for (k, name) in pivot.columns.iter().enumerate() {
                    let bars: Vec<Bar> = pivot
                        .cells
                        .iter()
                        .enumerate()
                        .filter_map(|(i, row)| {
                            let value = row.get(k).copied().flatten()?;
                            let x = i as f64 - 0.4 + band * (k as f64 + 0.5);
                            Some(Bar::new(x, value).width(band * 0.95))
                        })
                        .collect();
                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .color(PALETTE[k % PALETTE.len()])
                            .name(name),
                    );
                }
            });
    }

    fn draw_donut(ui: &mut egui::Ui, id: &str, aggregate: &Aggregate) {
        let total: f64 = aggregate.values().iter().sum();

        Plot::new(format!("donut_{id}"))
            .height(PLOT_HEIGHT)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                if total <= 0.0 {
                    return;
                }
                let mut start = std::f64::consts::FRAC_PI_2;
                for (k, (label, value)) in aggregate.pairs().into_iter().enumerate() {
                    let sweep = value / total * std::f64::consts::TAU;
                    let color = PALETTE[k % PALETTE.len()];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(ring_segment(0.4, 1.0, start, start - sweep)))
                            .fill_color(color)
                            .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                            .name(format!("{label} ({:.1}%)", value / total * 100.0)),
                    );
                    start -= sweep;
                }
            });
    }

    fn draw_histograms(ui: &mut egui::Ui, id: &str, histograms: &[SexHistogram]) {
        ui.columns(histograms.len().max(1), |columns| {
            for (k, (column, hist)) in columns.iter_mut().zip(histograms).enumerate() {
                column.label(RichText::new(format!("{} Gender", hist.sex)).strong());
                let bars: Vec<Bar> = hist
                    .bins
                    .iter()
                    .map(|b| {
                        Bar::new((b.lower + b.upper) / 2.0, b.count as f64)
                            .width(b.upper - b.lower)
                    })
                    .collect();

                Plot::new(format!("hist_{id}_{k}"))
                    .height(PLOT_HEIGHT - 40.0)
                    .allow_scroll(false)
                    .x_axis_label("Number of Suicides")
                    .y_axis_label("Frequency")
                    .show(column, |plot_ui| {
                        plot_ui.bar_chart(
                            BarChart::new(bars)
                                .color(PALETTE[k % PALETTE.len()].gamma_multiply(0.6))
                                .name(&hist.sex),
                        );
                    });
            }
        });
    }

    fn draw_pivot(ui: &mut egui::Ui, pivot: &Pivot) {
        let max = pivot.max_value().unwrap_or(0.0);
        Self::draw_grid(
            ui,
            &pivot.rows,
            &pivot.columns,
            &pivot.cells,
            |v| {
                let t = if max > 0.0 { v / max } else { 0.0 };
                lerp(Color32::from_rgb(255, 255, 217), Color32::from_rgb(37, 52, 148), t)
            },
            |v| format!("{v:.0}"),
        );
    }

    fn draw_correlation(ui: &mut egui::Ui, matrix: &CorrelationMatrix) {
        let cells: Vec<Vec<Option<f64>>> = matrix
            .values
            .iter()
            .map(|row| row.iter().map(|v| Some(*v).filter(|v| !v.is_nan())).collect())
            .collect();
        Self::draw_grid(
            ui,
            &matrix.columns,
            &matrix.columns,
            &cells,
            |v| {
                let neutral = Color32::from_rgb(247, 247, 247);
                if v < 0.0 {
                    lerp(neutral, Color32::from_rgb(59, 76, 192), -v as f32)
                } else {
                    lerp(neutral, Color32::from_rgb(180, 4, 38), v as f32)
                }
            },
            |v| format!("{v:.2}"),
        );
    }

    /// Annotated colour grid painted cell by cell.
    fn draw_grid(
        ui: &mut egui::Ui,
        rows: &[String],
        columns: &[String],
        cells: &[Vec<Option<f64>>],
        color_of: impl Fn(f64) -> Color32,
        format_cell: impl Fn(f64) -> String,
    ) {
        const CELL: egui::Vec2 = egui::vec2(90.0, 28.0);
        const LABEL_WIDTH: f32 = 150.0;

        ui.horizontal(|ui| {
            ui.add_space(LABEL_WIDTH);
            for name in columns {
                ui.add_sized(CELL, egui::Label::new(RichText::new(name).size(11.0)).truncate());
            }
        });

        for (name, row) in rows.iter().zip(cells) {
            ui.horizontal(|ui| {
                ui.add_sized(
                    egui::vec2(LABEL_WIDTH, CELL.y),
                    egui::Label::new(RichText::new(name).size(11.0)).truncate(),
                );
                for cell in row {
                    let (rect, _) = ui.allocate_exact_size(CELL, Sense::hover());
                    let fill = cell.map_or(Color32::from_gray(220), &color_of);
                    ui.painter().rect_filled(rect.shrink(1.0), 2.0, fill);
                    if let Some(v) = cell {
                        let text_color = if fill.r() as u32 + fill.g() as u32 + fill.b() as u32 > 380 {
                            Color32::BLACK
                        } else {
                            Color32::WHITE
                        };
                        ui.painter().text(
                            rect.center(),
                            Align2::CENTER_CENTER,
                            format_cell(*v),
                            FontId::proportional(11.0),
                            text_color,
                        );
                    }
                }
            });
        }
    }
}

fn lerp(a: Color32, b: Color32, t: impl Into<f64>) -> Color32 {
    let t = t.into().clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

/// Ring segment between two angles, as a closed outline in plot coordinates.
pub fn ring_segment(inner: f64, outer: f64, start: f64, end: f64) -> Vec<[f64; 2]> {
    let steps = (((end - start).abs() / 0.05).ceil() as usize).max(2);
    let arc = |radius: f64, i: usize| {
        let angle = start + (end - start) * i as f64 / steps as f64;
        [radius * angle.cos(), radius * angle.sin()]
    };

    let mut points: Vec<[f64; 2]> = (0..=steps).map(|i| arc(outer, i)).collect();
    points.extend((0..=steps).rev().map(|i| arc(inner, i)));
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_segment_endpoints() {
        let points = ring_segment(0.5, 1.0, 0.0, std::f64::consts::PI);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!((first[0] - 1.0).abs() < 1e-9 && first[1].abs() < 1e-9);
        assert!((last[0] - 0.5).abs() < 1e-9 && last[1].abs() < 1e-9);
    }

    #[test]
    fn test_category_formatter_only_labels_integers() {
        let format = ChartPlotter::category_formatter(vec!["a".into(), "b".into()]);
        let mark = |value| egui_plot::GridMark {
            value,
            step_size: 1.0,
        };
        assert_eq!(format(mark(1.0), &(0.0..=1.0)), "b");
        assert_eq!(format(mark(0.5), &(0.0..=1.0)), "");
        assert_eq!(format(mark(5.0), &(0.0..=1.0)), "");
    }
}
