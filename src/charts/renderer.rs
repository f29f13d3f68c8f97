//! Static Chart Renderer
//! Writes each chart section of a report to a PNG file with plotters,
//! plus a JSON dump and a plain-text copy of the whole report.

use crate::report::{Figure, Report, Section};
use crate::stats::{Aggregate, CorrelationMatrix, Pivot, SexHistogram};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const FONT: &str = "sans-serif";

const BAR_COLOR: RGBColor = RGBColor(214, 39, 40);
const AREA_COLOR: RGBColor = RGBColor(29, 53, 87);
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(255, 105, 180), // female
    RGBColor(0, 0, 128),     // male
    RGBColor(46, 204, 113),
    RGBColor(243, 156, 18),
    RGBColor(155, 89, 182),
    RGBColor(26, 188, 156),
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to draw '{title}': {message}")]
    Draw { title: String, message: String },
}

type DrawResult = Result<(), Box<dyn Error>>;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Export the report into `dir`: one PNG per chart section,
    /// `report.json` and `report.txt`. Returns the written paths.
    pub fn export_report(report: &Report, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for (idx, section) in report.sections.iter().enumerate() {
            if !section.figure.is_chart() {
                continue;
            }
            let path = dir.join(format!("{:02}_{}.png", idx + 1, slug(&section.title)));
            Self::render_section(section, &path).map_err(|e| RenderError::Draw {
                title: section.title.clone(),
                message: e.to_string(),
            })?;
            written.push(path);
        }

        let json_path = dir.join("report.json");
        fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
        written.push(json_path);

        let text_path = dir.join("report.txt");
        fs::write(&text_path, report.to_string())?;
        written.push(text_path);

        log::info!("Exported {} files to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Render one chart section to a PNG file.
    pub fn render_section(section: &Section, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let title = section.title.as_str();

        match &section.figure {
            Figure::Bar {
                aggregate,
                horizontal: false,
            } => Self::draw_bars(&root, title, aggregate)?,
            Figure::Bar {
                aggregate,
                horizontal: true,
            } => Self::draw_horizontal_bars(&root, title, aggregate)?,
            Figure::Line(aggregate) => Self::draw_line(&root, title, aggregate)?,
            Figure::Area(aggregate) => Self::draw_area(&root, title, aggregate)?,
            Figure::GroupedBar(aggregate) => Self::draw_grouped_bars(&root, title, aggregate)?,
            Figure::Donut(aggregate) => Self::draw_donut(&root, title, aggregate)?,
            Figure::Heatmap(pivot) => Self::draw_pivot(&root, title, pivot)?,
            Figure::Histogram(histograms) => Self::draw_histograms(&root, title, histograms)?,
            Figure::Correlation(matrix) => Self::draw_correlation(&root, title, matrix)?,
            Figure::KeyValues(_) | Figure::Summary(_) | Figure::Notice(_) => {
                root.titled(title, (FONT, 28))?;
            }
        }

        root.present()?;
        Ok(())
    }

    fn value_ceiling(values: &[f64]) -> f64 {
        let max = values.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    fn draw_bars(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let labels = aggregate.labels();
        let values = aggregate.values();

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(90)
            .build_cartesian_2d(
                (0..labels.len().max(1)).into_segmented(),
                0.0..Self::value_ceiling(&values),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
            .y_desc(aggregate.value_column.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(4)
                .data(values.iter().enumerate().map(|(i, v)| (i, *v))),
        )?;
        Ok(())
    }

    fn draw_horizontal_bars(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let labels = aggregate.labels();
        let values = aggregate.values();

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(140)
            .build_cartesian_2d(
                0.0..Self::value_ceiling(&values),
                (0..labels.len().max(1)).into_segmented(),
            )?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(labels.len().max(1))
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc(aggregate.value_column.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::horizontal(&chart)
                .style(RGBColor(135, 206, 235).filled())
                .margin(6)
                .data(values.iter().enumerate().map(|(i, v)| (i, *v))),
        )?;
        Ok(())
    }

    fn draw_line(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let points: Vec<(f64, f64)> = aggregate
            .rows
            .iter()
            .filter_map(|r| Some((r.keys.first()?.parse::<f64>().ok()?, r.value)))
            .collect();
        let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let (x_min, x_max) = if points.is_empty() {
            (0.0, 1.0)
        } else if x_min == x_max {
            (x_min - 1.0, x_max + 1.0)
        } else {
            (x_min, x_max)
        };

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, 0.0..Self::value_ceiling(&aggregate.values()))?;

        chart
            .configure_mesh()
            .x_label_formatter(&|x| format!("{x:.0}"))
            .x_desc("year")
            .y_desc(aggregate.value_column.as_str())
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), BAR_COLOR.stroke_width(2)))?;
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, BAR_COLOR.filled())))?;
        Ok(())
    }

    fn draw_area(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let labels = aggregate.labels();
        let values = aggregate.values();
        let n = values.len().max(1) as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.5..(n - 0.5), 0.0..Self::value_ceiling(&values))?;

        chart
            .configure_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|x| {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_desc("Age Group")
            .y_desc("Total Number of Suicidal Cases")
            .draw()?;

        chart.draw_series(
            AreaSeries::new(
                values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                0.0,
                AREA_COLOR.mix(0.7),
            )
            .border_style(AREA_COLOR),
        )?;
        Ok(())
    }

    fn draw_grouped_bars(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let pivot = Pivot::from_aggregate(aggregate);
        let groups = pivot.rows.len().max(1) as f64;
        let series = pivot.columns.len().max(1) as f64;
        let ceiling = Self::value_ceiling(&aggregate.values());

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.5..(groups - 0.5), 0.0..ceiling)?;

        let rows = pivot.rows.clone();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows.len().max(1))
            .x_label_formatter(&|x| {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                    rows.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_desc(pivot.row_key.as_str())
            .y_desc("Total Suicidal Cases")
            .draw()?;

        let band = 0.8 / series;
        for (k, name) in pivot.columns.iter().enumerate() {
            let color = SERIES_COLORS[k % SERIES_COLORS.len()];
            let bars: Vec<Rectangle<(f64, f64)>> = pivot
                .cells
                .iter()
                .enumerate()
                .filter_map(|(i, row)| {
                    let value = row.get(k).copied().flatten()?;
                    let x0 = i as f64 - 0.4 + k as f64 * band;
                    Some(Rectangle::new([(x0, 0.0), (x0 + band, value)], color.filled()))
                })
                .collect();

            chart
                .draw_series(bars)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_donut(root: &Area<'_>, title: &str, aggregate: &Aggregate) -> DrawResult {
        let area = root.titled(title, (FONT, 28))?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let outer = (w.min(h) as f64 / 2.0) * 0.8;
        let inner = outer * 0.4;

        let total: f64 = aggregate.values().iter().sum();
        if total <= 0.0 {
            return Ok(());
        }

        let mut start = -std::f64::consts::FRAC_PI_2;
        for (k, (label, value)) in aggregate.pairs().into_iter().enumerate() {
            let sweep = value / total * std::f64::consts::TAU;
            let color = SERIES_COLORS[k % SERIES_COLORS.len()];
            let points = wedge_points(center, inner, outer, start, start + sweep);
            area.draw(&Polygon::new(points, color.filled()))?;

            let mid = start + sweep / 2.0;
            let radius = outer + 30.0;
            let text = format!("{label} {:.1}%", value / total * 100.0);
            area.draw(&Text::new(
                text,
                (
                    (center.0 + radius * mid.cos()) as i32 - 40,
                    (center.1 + radius * mid.sin()) as i32,
                ),
                (FONT, 18).into_font(),
            ))?;
            start += sweep;
        }
        Ok(())
    }

    fn draw_pivot(root: &Area<'_>, title: &str, pivot: &Pivot) -> DrawResult {
        let max = pivot.max_value().unwrap_or(0.0);
        draw_grid(
            root,
            title,
            &pivot.rows,
            &pivot.columns,
            &pivot.cells,
            |v| {
                let t = if max > 0.0 { v / max } else { 0.0 };
                lerp(RGBColor(255, 255, 217), RGBColor(37, 52, 148), t)
            },
            |v| format!("{v:.0}"),
        )
    }

    fn draw_correlation(root: &Area<'_>, title: &str, matrix: &CorrelationMatrix) -> DrawResult {
        let cells: Vec<Vec<Option<f64>>> = matrix
            .values
            .iter()
            .map(|row| row.iter().map(|v| Some(*v).filter(|v| !v.is_nan())).collect())
            .collect();
        draw_grid(
            root,
            title,
            &matrix.columns,
            &matrix.columns,
            &cells,
            |v| {
                if v < 0.0 {
                    lerp(RGBColor(247, 247, 247), RGBColor(59, 76, 192), -v)
                } else {
                    lerp(RGBColor(247, 247, 247), RGBColor(180, 4, 38), v)
                }
            },
            |v| format!("{v:.2}"),
        )
    }

    fn draw_histograms(root: &Area<'_>, title: &str, histograms: &[SexHistogram]) -> DrawResult {
        let area = root.titled(title, (FONT, 28))?;
        if histograms.is_empty() {
            return Ok(());
        }
        let panels = area.split_evenly((1, histograms.len()));

        for (k, (panel, hist)) in panels.iter().zip(histograms).enumerate() {
            let color = SERIES_COLORS[k % SERIES_COLORS.len()];
            let lo = hist.bins.first().map_or(0.0, |b| b.lower);
            let hi = hist.bins.last().map_or(1.0, |b| b.upper);
            let max_count = hist.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;

            let mut chart = ChartBuilder::on(panel)
                .caption(format!("{} Gender", hist.sex), (FONT, 20))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(lo..hi, 0.0..max_count * 1.1)?;

            chart
                .configure_mesh()
                .x_desc("Number of Suicides")
                .y_desc("Frequency")
                .draw()?;

            chart.draw_series(hist.bins.iter().map(|b| {
                Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], color.mix(0.5).filled())
            }))?;
        }
        Ok(())
    }
}

/// Annotated colour grid with row labels on the left and column labels on top.
fn draw_grid(
    root: &Area<'_>,
    title: &str,
    rows: &[String],
    columns: &[String],
    cells: &[Vec<Option<f64>>],
    color_of: impl Fn(f64) -> RGBColor,
    format_cell: impl Fn(f64) -> String,
) -> DrawResult {
    let area = root.titled(title, (FONT, 28))?;
    if rows.is_empty() || columns.is_empty() {
        return Ok(());
    }

    let (w, h) = area.dim_in_pixel();
    let left = 180i32;
    let top = 60i32;
    let cell_w = ((w as i32 - left - 20) / columns.len() as i32).max(1);
    let cell_h = ((h as i32 - top - 20) / rows.len() as i32).max(1);

    for (j, name) in columns.iter().enumerate() {
        area.draw(&Text::new(
            name.clone(),
            (left + j as i32 * cell_w + 4, top - 24),
            (FONT, 14).into_font(),
        ))?;
    }

    for (i, (name, row)) in rows.iter().zip(cells).enumerate() {
        let y = top + i as i32 * cell_h;
        area.draw(&Text::new(
            name.clone(),
            (8, y + cell_h / 2 - 7),
            (FONT, 14).into_font(),
        ))?;

        for (j, cell) in row.iter().enumerate() {
            let x = left + j as i32 * cell_w;
            let fill = cell.map_or(RGBColor(220, 220, 220), &color_of);
            area.draw(&Rectangle::new(
                [(x, y), (x + cell_w, y + cell_h)],
                fill.filled(),
            ))?;
            area.draw(&Rectangle::new(
                [(x, y), (x + cell_w, y + cell_h)],
                WHITE.stroke_width(1),
            ))?;
            if let Some(v) = cell {
                area.draw(&Text::new(
                    format_cell(*v),
                    (x + cell_w / 2 - 20, y + cell_h / 2 - 7),
                    (FONT, 14).into_font(),
                ))?;
            }
        }
    }
    Ok(())
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Outline of a ring segment in pixel coordinates.
fn wedge_points(
    center: (f64, f64),
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let steps = (((end - start).abs() / 0.05).ceil() as usize).max(2);
    let arc = |radius: f64, i: usize| {
        let angle = start + (end - start) * i as f64 / steps as f64;
        (
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        )
    };

    let mut points: Vec<(i32, i32)> = (0..=steps).map(|i| arc(outer, i)).collect();
    points.extend((0..=steps).rev().map(|i| arc(inner, i)));
    points
}

/// File-name friendly form of a section title.
fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::{AgeGroup, Record, Sex, Table};

    fn report() -> Report {
        let table = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 10)
                .with_hdi(0.7)
                .with_rate(3.0)
                .with_gdp(1.0e9, 500.0),
            Record::new("A", 2001, Sex::Female, 5)
                .with_age(AgeGroup::Years75Plus)
                .with_rate(1.0)
                .with_gdp(1.2e9, 650.0),
            Record::new("B", 2000, Sex::Male, 1)
                .with_hdi(0.8)
                .with_rate(5.0)
                .with_gdp(4.0e8, 900.0),
        ])
        .unwrap();
        Report::build(&table, &DashboardConfig::default(), Some("A")).unwrap()
    }

    #[test]
    fn test_export_report_writes_charts_and_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();

        let written = StaticChartRenderer::export_report(&report, dir.path()).unwrap();
        let charts = report.sections.iter().filter(|s| s.figure.is_chart()).count();
        assert_eq!(charts, 11);
        assert_eq!(written.len(), charts + 2);
        assert!(written.iter().all(|p| p.exists()));
        assert!(dir.path().join("18_suicide_trends_over_time_in_a.png").exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(json["sections"][17]["figure"]["kind"], "line");

        let text = fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(text.contains("== Suicide Trends Over Time in A =="));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Suicide Trends Over Time in Côte d'Ivoire"), "suicide_trends_over_time_in_c_te_d_ivoire");
        assert_eq!(slug("  Top 5 / Most  "), "top_5_most");
    }

    #[test]
    fn test_wedge_closes_ring() {
        let points = wedge_points((100.0, 100.0), 10.0, 50.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_eq!(points.first(), Some(&(150, 100)));
        assert_eq!(points.last(), Some(&(110, 100)));
        assert_eq!(points.len() % 2, 0);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = RGBColor(0, 0, 0);
        let b = RGBColor(200, 100, 50);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp(a, b, 2.0), b);
    }
}
