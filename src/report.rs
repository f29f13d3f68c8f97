//! Report Module
//! Runs the aggregation pipeline and labels each result for the presenters.

use crate::config::DashboardConfig;
use crate::data::{DataCleaner, Table};
use crate::stats::{
    Aggregate, AggregateError, Aggregator, ColumnSummary, CorrelationMatrix, Pivot, SexHistogram,
    StatsCalculator,
};
use polars::prelude::PolarsResult;
use serde::Serialize;
use std::fmt;

/// What a section shows; presenters decide how to draw it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Figure {
    KeyValues(Vec<(String, String)>),
    Summary(Vec<ColumnSummary>),
    Bar { aggregate: Aggregate, horizontal: bool },
    Donut(Aggregate),
    Area(Aggregate),
    Line(Aggregate),
    GroupedBar(Aggregate),
    Heatmap(Pivot),
    Histogram(Vec<SexHistogram>),
    Correlation(CorrelationMatrix),
    Notice(String),
}

impl Figure {
    /// Whether the figure is drawn as a chart rather than text.
    pub fn is_chart(&self) -> bool {
        !matches!(
            self,
            Figure::KeyValues(_) | Figure::Summary(_) | Figure::Notice(_)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub figure: Figure,
}

impl Section {
    fn new(title: impl Into<String>, figure: Figure) -> Self {
        Self {
            title: title.into(),
            figure,
        }
    }

    fn key_values<K: ToString, V: ToString>(
        title: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(title, Figure::KeyValues(pairs))
    }

    /// The trend view for one country, or a notice when there is nothing to plot.
    pub fn trend(table: &Table, country: Option<&str>) -> PolarsResult<Self> {
        let Some(country) = country else {
            return Ok(Self::new(
                "Suicide Trends Over Time",
                Figure::Notice("No data available.".to_string()),
            ));
        };

        let title = format!("Suicide Trends Over Time in {country}");
        match Aggregator::time_series_for_country(table, country) {
            Ok(series) => Ok(Self::new(title, Figure::Line(series))),
            Err(AggregateError::EmptySelection(e)) => {
                Ok(Self::new(title, Figure::Notice(e.to_string())))
            }
            Err(AggregateError::PolarsError(e)) => Err(e),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        match &self.figure {
            Figure::KeyValues(pairs) => {
                for (k, v) in pairs {
                    writeln!(f, "{k}: {v}")?;
                }
            }
            Figure::Summary(rows) => {
                writeln!(
                    f,
                    "{:<20} {:>8} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
                    "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
                )?;
                for s in rows {
                    writeln!(
                        f,
                        "{:<20} {:>8} {:>14.3} {:>14.3} {:>14.3} {:>14.3} {:>14.3} {:>14.3} {:>14.3}",
                        s.column, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
                    )?;
                }
            }
            Figure::Bar { aggregate, .. }
            | Figure::Donut(aggregate)
            | Figure::Area(aggregate)
            | Figure::Line(aggregate)
            | Figure::GroupedBar(aggregate) => {
                for (label, value) in aggregate.pairs() {
                    writeln!(f, "{label}: {}", format_number(value))?;
                }
            }
            Figure::Heatmap(pivot) => {
                writeln!(f, "{} \\ {}: {}", pivot.row_key, pivot.column_key, pivot.columns.join(", "))?;
                for (row, cells) in pivot.rows.iter().zip(&pivot.cells) {
                    let cells: Vec<String> = cells
                        .iter()
                        .map(|c| c.map_or("-".to_string(), format_number))
                        .collect();
                    writeln!(f, "{row}: {}", cells.join(", "))?;
                }
            }
            Figure::Histogram(histograms) => {
                for h in histograms {
                    let counts: Vec<String> = h.bins.iter().map(|b| b.count.to_string()).collect();
                    writeln!(f, "{}: {}", h.sex, counts.join(" "))?;
                }
            }
            Figure::Correlation(matrix) => {
                for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                    let cells: Vec<String> = row.iter().map(|r| format!("{r:.2}")).collect();
                    writeln!(f, "{name}: {}", cells.join(" "))?;
                }
            }
            Figure::Notice(message) => writeln!(f, "{message}")?,
        }
        Ok(())
    }
}

/// Every figure of the dashboard, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub sections: Vec<Section>,
    trend_index: usize,
}

impl Report {
    /// Run every aggregation over `table` (and its HDI-complete view).
    pub fn build(
        table: &Table,
        config: &DashboardConfig,
        country: Option<&str>,
    ) -> Result<Self, AggregateError> {
        let cleaned = DataCleaner::clean(table)?;
        let mut sections = Vec::new();

        let years = match Aggregator::year_range(table)? {
            Some((min, max)) => vec![("Min Year", min.to_string()), ("Max Year", max.to_string())],
            None => vec![("Min Year", "-".to_string()), ("Max Year", "-".to_string())],
        };
        sections.push(Section::key_values("Year Range", years));

        sections.push(Section::key_values(
            "Data Information",
            Aggregator::column_info(table)
                .into_iter()
                .map(|c| (c.name, format!("{} non-null, {}", c.non_null, c.dtype))),
        ));

        sections.push(Section::new(
            "Summary Statistics",
            Figure::Summary(StatsCalculator::summary_statistics(table)?),
        ));

        sections.push(Section::key_values(
            "Missing Values in Each Column",
            Aggregator::missing_value_counts(table),
        ));

        let shape = Aggregator::shape_info(table);
        sections.push(Section::key_values(
            "Shape Information",
            [
                ("Number of Rows", shape.row_count.to_string()),
                ("Number of Columns", shape.column_count.to_string()),
                ("Column Names", shape.column_names.join(", ")),
            ],
        ));

        // Both rankings read the base table so they agree with the country charts
        let most = Aggregator::top_n_countries_by_total(table, config.ranking_size, false)?;
        sections.push(Section::key_values(
            format!("Top {} Countries with Most Suicides", config.ranking_size),
            most.pairs().into_iter().map(|(c, v)| (c, format_number(v))),
        ));

        let mean_rate = Aggregator::mean_rate_per_100k(&cleaned)?
            .map_or("-".to_string(), |m| format!("{m:.2}"));
        sections.push(Section::key_values(
            "Average Suicides per 100k Population",
            [("Average suicides per 100k population", mean_rate)],
        ));

        let top10 = Aggregator::totals_by_country_top10(table)?;
        let bottom10 = Aggregator::totals_by_country_bottom10(table)?;
        sections.push(Section::key_values(
            "Countries with Lowest Total Suicides",
            bottom10.pairs().into_iter().map(|(c, v)| (c, format_number(v))),
        ));

        sections.push(Section::new(
            "Distribution of Suicides by Sex",
            Figure::Donut(Aggregator::totals_by_sex(table)?),
        ));
        sections.push(Section::new(
            "Distribution of Suicide Counts by Gender",
            Figure::Histogram(Aggregator::suicides_histogram_by_sex(
                table,
                config.histogram_bins,
            )?),
        ));
        sections.push(Section::new(
            "Top Countries with Highest Total Suicidal Cases",
            Figure::Bar {
                aggregate: top10,
                horizontal: false,
            },
        ));
        sections.push(Section::new(
            "Countries with Lowest Total Suicidal Cases",
            Figure::Bar {
                aggregate: bottom10,
                horizontal: false,
            },
        ));
        sections.push(Section::new(
            "Average Suicide Rate by Country",
            Figure::Bar {
                aggregate: Aggregator::mean_rate_by_country(table)?,
                horizontal: false,
            },
        ));

        let by_age = Aggregator::totals_by_age(table)?;
        sections.push(Section::new(
            "Distribution of Suicidal Cases by Age Group",
            Figure::Bar {
                aggregate: by_age.clone(),
                horizontal: true,
            },
        ));
        sections.push(Section::new("Suicide Cases by Age Group", Figure::Area(by_age)));

        let by_generation = Aggregator::totals_by_generation_and_sex(&cleaned)?;
        let pivot = Pivot::from_aggregate(&by_generation);
        sections.push(Section::new(
            "Total Suicidal Cases by Generation and Gender",
            Figure::GroupedBar(by_generation),
        ));
        sections.push(Section::new(
            "Heatmap of Total Suicidal Cases by Generation and Gender",
            Figure::Heatmap(pivot),
        ));

        let trend_index = sections.len();
        sections.push(Section::trend(table, country)?);

        sections.push(Section::new(
            "Correlation Heatmap of Numerical Features",
            Figure::Correlation(StatsCalculator::correlation_matrix(table)?),
        ));

        Ok(Self {
            sections,
            trend_index,
        })
    }

    pub fn trend(&self) -> &Section {
        &self.sections[self.trend_index]
    }

    /// Recompute only the country-dependent section.
    pub fn select_country(&mut self, table: &Table, country: Option<&str>) -> PolarsResult<()> {
        self.sections[self.trend_index] = Section::trend(table, country)?;
        Ok(())
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "{section}")?;
        }
        Ok(())
    }
}
