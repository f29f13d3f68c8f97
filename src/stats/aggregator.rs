//! Aggregation Module
//! Group-by and reduce operations behind every dashboard figure.
//!
//! Each operation is a pure function of the table it is given. Results are
//! ordered deterministically: by the requested value, then by the grouping
//! key (alphabetical text, ascending years, natural age-group order).

use super::calculator::{HistogramBin, StatsCalculator};
use crate::data::schema::{
    AgeGroup, AGE, COUNTRY, GENERATION, RATE_PER_100K, SEX, SUICIDES_NO, YEAR,
};
use crate::data::Table;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Number of countries in the top / bottom country charts.
pub const COUNTRY_CHART_SIZE: usize = 10;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    EmptySelection(#[from] EmptySelectionError),
}

/// The chosen country has no records in the table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No data available for {country}.")]
pub struct EmptySelectionError {
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub keys: Vec<String>,
    pub value: f64,
}

/// A grouped, reduced result: one row per non-null key combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub key_columns: Vec<String>,
    pub value_column: String,
    pub rows: Vec<AggregateRow>,
}

impl Aggregate {
    /// Read key and value columns back out of a collected frame.
    /// Rows with a null key or a null value are skipped.
    fn from_frame(df: &DataFrame, keys: &[&str], value: &str) -> PolarsResult<Self> {
        let key_cols = keys
            .iter()
            .map(|k| df.column(k)?.cast(&DataType::String))
            .collect::<PolarsResult<Vec<_>>>()?;
        let key_vals = key_cols
            .iter()
            .map(|c| c.str())
            .collect::<PolarsResult<Vec<_>>>()?;
        let values = df.column(value)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let row_keys: Option<Vec<String>> = key_vals
                .iter()
                .map(|ca| ca.get(i).map(str::to_string))
                .collect();
            if let (Some(keys), Some(value)) = (row_keys, values.get(i)) {
                rows.push(AggregateRow { keys, value });
            }
        }

        Ok(Self {
            key_columns: keys.iter().map(|k| k.to_string()).collect(),
            value_column: value.to_string(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row labels; multi-key rows are joined with " / ".
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.keys.join(" / ")).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    pub fn pairs(&self) -> Vec<(String, f64)> {
        self.labels().into_iter().zip(self.values()).collect()
    }

    pub fn value_of(&self, keys: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.keys.iter().map(String::as_str).eq(keys.iter().copied()))
            .map(|r| r.value)
    }
}

/// Two-key aggregate laid out as a grid (first key down, second key across).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub row_key: String,
    pub column_key: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        let rows: Vec<String> = aggregate
            .rows
            .iter()
            .filter_map(|r| r.keys.first().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<String> = aggregate
            .rows
            .iter()
            .filter_map(|r| r.keys.get(1).cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![None; columns.len()]; rows.len()];
        for row in &aggregate.rows {
            let (Some(r), Some(c)) = (row.keys.first(), row.keys.get(1)) else {
                continue;
            };
            if let (Some(i), Some(j)) = (
                rows.iter().position(|x| x == r),
                columns.iter().position(|x| x == c),
            ) {
                cells[i][j] = Some(row.value);
            }
        }

        Self {
            row_key: aggregate.key_columns.first().cloned().unwrap_or_default(),
            column_key: aggregate.key_columns.get(1).cloned().unwrap_or_default(),
            rows,
            columns,
            cells,
        }
    }

    pub fn max_value(&self) -> Option<f64> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeInfo {
    pub row_count: usize,
    pub column_count: usize,
    pub column_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SexHistogram {
    pub sex: String,
    pub bins: Vec<HistogramBin>,
}

/// Stateless aggregation operations over a `Table`.
pub struct Aggregator;

impl Aggregator {
    /// Group by `keys` (nulls excluded), reduce with `agg`, sort by the keys.
    fn grouped(table: &Table, keys: &[&str], agg: Expr) -> PolarsResult<DataFrame> {
        let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
        let present = keys
            .iter()
            .map(|k| col(*k).is_not_null())
            .reduce(|a, b| a.and(b))
            .unwrap_or_else(|| lit(true));

        table
            .frame()
            .clone()
            .lazy()
            .filter(present)
            .group_by(key_exprs)
            .agg([agg])
            .sort(keys.to_vec(), SortMultipleOptions::default())
            .collect()
    }

    fn sum_by(table: &Table, keys: &[&str]) -> PolarsResult<Aggregate> {
        let df = Self::grouped(table, keys, col(SUICIDES_NO).sum())?;
        Aggregate::from_frame(&df, keys, SUICIDES_NO)
    }

    pub fn shape_info(table: &Table) -> ShapeInfo {
        ShapeInfo {
            row_count: table.height(),
            column_count: table.width(),
            column_names: table.column_names(),
        }
    }

    /// Missing entries per column, in column order.
    pub fn missing_value_counts(table: &Table) -> Vec<(String, usize)> {
        table
            .frame()
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }

    pub fn column_info(table: &Table) -> Vec<ColumnInfo> {
        table
            .frame()
            .get_columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                dtype: c.dtype().to_string(),
                non_null: c.len() - c.null_count(),
            })
            .collect()
    }

    pub fn year_range(table: &Table) -> PolarsResult<Option<(i64, i64)>> {
        let years = table.frame().column(YEAR)?.cast(&DataType::Int64)?;
        let years = years.i64()?;
        Ok(years.min().zip(years.max()))
    }

    /// Distinct non-null country names, sorted.
    pub fn distinct_countries(table: &Table) -> PolarsResult<Vec<String>> {
        let countries = table.frame().column(COUNTRY)?.str()?;
        Ok(countries
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    /// Countries ranked by total `suicides_no`, first `n` rows.
    /// Ties are broken by country name ascending.
    pub fn top_n_countries_by_total(
        table: &Table,
        n: usize,
        ascending: bool,
    ) -> PolarsResult<Aggregate> {
        let df = table
            .frame()
            .clone()
            .lazy()
            .filter(col(COUNTRY).is_not_null())
            .group_by([col(COUNTRY)])
            .agg([col(SUICIDES_NO).sum()])
            .sort(
                [SUICIDES_NO, COUNTRY],
                SortMultipleOptions::default().with_order_descending_multi([!ascending, false]),
            )
            .limit(n as IdxSize)
            .collect()?;

        Aggregate::from_frame(&df, &[COUNTRY], SUICIDES_NO)
    }

    pub fn totals_by_country_top10(table: &Table) -> PolarsResult<Aggregate> {
        Self::top_n_countries_by_total(table, COUNTRY_CHART_SIZE, false)
    }

    pub fn totals_by_country_bottom10(table: &Table) -> PolarsResult<Aggregate> {
        Self::top_n_countries_by_total(table, COUNTRY_CHART_SIZE, true)
    }

    /// Mean of `suicides/100k pop`; `None` when no value is present.
    pub fn mean_rate_per_100k(table: &Table) -> PolarsResult<Option<f64>> {
        let rates = table.f64_values(RATE_PER_100K)?;
        if rates.is_empty() {
            return Ok(None);
        }
        Ok(Some(rates.iter().mean()))
    }

    pub fn totals_by_sex(table: &Table) -> PolarsResult<Aggregate> {
        Self::sum_by(table, &[SEX])
    }

    pub fn mean_rate_by_country(table: &Table) -> PolarsResult<Aggregate> {
        let df = Self::grouped(table, &[COUNTRY], col(RATE_PER_100K).mean())?;
        Aggregate::from_frame(&df, &[COUNTRY], RATE_PER_100K)
    }

    /// Totals per age group, youngest band first.
    pub fn totals_by_age(table: &Table) -> PolarsResult<Aggregate> {
        let mut aggregate = Self::sum_by(table, &[AGE])?;
        aggregate.rows.sort_by(|a, b| {
            let rank = |row: &AggregateRow| {
                row.keys[0]
                    .parse::<AgeGroup>()
                    .map_or(usize::MAX, |group| group as usize)
            };
            rank(a).cmp(&rank(b)).then_with(|| a.keys.cmp(&b.keys))
        });
        Ok(aggregate)
    }

    /// Totals per (generation, sex). Feeds both the grouped bars and the pivot.
    pub fn totals_by_generation_and_sex(table: &Table) -> PolarsResult<Aggregate> {
        Self::sum_by(table, &[GENERATION, SEX])
    }

    /// Yearly totals for one country, oldest year first.
    ///
    /// A country absent from the table is an `EmptySelectionError`; a present
    /// country whose counts are all zero yields zero-valued rows.
    pub fn time_series_for_country(
        table: &Table,
        country: &str,
    ) -> Result<Aggregate, AggregateError> {
        let selected = table
            .frame()
            .clone()
            .lazy()
            .filter(col(COUNTRY).eq(lit(country)))
            .collect()?;

        if selected.height() == 0 {
            log::warn!("No records for country '{country}'");
            return Err(EmptySelectionError {
                country: country.to_string(),
            }
            .into());
        }

        Ok(Self::sum_by(&Table::new(selected), &[YEAR])?)
    }

    /// Histogram of `suicides_no` per sex over the column's global range.
    pub fn suicides_histogram_by_sex(
        table: &Table,
        bins: usize,
    ) -> PolarsResult<Vec<SexHistogram>> {
        let sexes = table.frame().column(SEX)?.str()?;
        let counts = table.f64_options(SUICIDES_NO)?;

        let mut by_sex: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (sex, count) in sexes.into_iter().zip(counts) {
            if let (Some(sex), Some(count)) = (sex, count) {
                by_sex.entry(sex.to_string()).or_default().push(count);
            }
        }

        let all: Vec<f64> = by_sex.values().flatten().copied().collect();
        if all.is_empty() {
            return Ok(Vec::new());
        }
        let min = all.iter().copied().fold(f64::INFINITY, f64::min);
        let max = all.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(by_sex
            .into_iter()
            .map(|(sex, values)| SexHistogram {
                bins: StatsCalculator::histogram(&values, min, max, bins),
                sex,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataCleaner, Record, Sex};

    /// The three-row scenario: A/2000 male 10, A/2000 female 5, B/2000 male 1.
    fn scenario() -> Table {
        Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 10),
            Record::new("A", 2000, Sex::Female, 5),
            Record::new("B", 2000, Sex::Male, 1),
        ])
        .unwrap()
    }

    fn countries() -> Table {
        let mut records = Vec::new();
        for (i, name) in ["Chile", "Aruba", "Brazil", "Denmark", "Egypt", "Fiji", "Ghana"]
            .iter()
            .enumerate()
        {
            records.push(Record::new(name, 2000, Sex::Male, (i as i64 % 3) * 10));
            records.push(Record::new(name, 2001, Sex::Female, 1).with_hdi(0.5));
        }
        for extra in ["Haiti", "Iran", "Japan", "Kenya", "Laos"] {
            records.push(Record::new(extra, 2000, Sex::Male, 100));
        }
        Table::from_records(&records).unwrap()
    }

    #[test]
    fn test_scenario_totals() {
        let t = scenario();

        let by_sex = Aggregator::totals_by_sex(&t).unwrap();
        assert_eq!(by_sex.len(), 2);
        assert_eq!(by_sex.value_of(&["male"]), Some(11.0));
        assert_eq!(by_sex.value_of(&["female"]), Some(5.0));

        let top = Aggregator::totals_by_country_top10(&t).unwrap();
        assert_eq!(top.pairs(), vec![("A".to_string(), 15.0), ("B".to_string(), 1.0)]);

        let series = Aggregator::time_series_for_country(&t, "A").unwrap();
        assert_eq!(series.pairs(), vec![("2000".to_string(), 15.0)]);
    }

    #[test]
    fn test_unknown_country_is_empty_selection() {
        let err = Aggregator::time_series_for_country(&scenario(), "Nonexistent Country")
            .unwrap_err();
        match err {
            AggregateError::EmptySelection(e) => assert_eq!(e.country, "Nonexistent Country"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_time_series_sorted_without_duplicates() {
        let t = Table::from_records(&[
            Record::new("A", 2003, Sex::Male, 1),
            Record::new("A", 2001, Sex::Male, 2),
            Record::new("A", 2003, Sex::Female, 4),
            Record::new("A", 2002, Sex::Female, 0),
            Record::new("B", 1999, Sex::Female, 9),
        ])
        .unwrap();

        let series = Aggregator::time_series_for_country(&t, "A").unwrap();
        assert_eq!(series.labels(), vec!["2001", "2002", "2003"]);
        assert_eq!(series.values(), vec![2.0, 0.0, 5.0]);
    }

    #[test]
    fn test_zero_total_country_is_valid() {
        let t = Table::from_records(&[Record::new("Z", 2010, Sex::Male, 0)]).unwrap();
        let series = Aggregator::time_series_for_country(&t, "Z").unwrap();
        assert_eq!(series.pairs(), vec![("2010".to_string(), 0.0)]);
    }

    #[test]
    fn test_ranking_order_and_ties() {
        let t = countries();

        let top = Aggregator::top_n_countries_by_total(&t, 5, false).unwrap();
        assert_eq!(top.labels(), vec!["Haiti", "Iran", "Japan", "Kenya", "Laos"]);

        let values = top.values();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));

        let top10: BTreeSet<String> = Aggregator::totals_by_country_top10(&t)
            .unwrap()
            .labels()
            .into_iter()
            .collect();
        assert_eq!(top10.len(), 10);
        assert!(top.labels().iter().all(|c| top10.contains(c)));

        // Chile, Denmark and Ghana tie at 1 and sort by name
        let bottom = Aggregator::totals_by_country_bottom10(&t).unwrap();
        assert_eq!(&bottom.labels()[..3], ["Chile", "Denmark", "Ghana"]);
        assert!(bottom.values().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_totals_by_age_natural_order() {
        let t = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 1).with_age(AgeGroup::Years75Plus),
            Record::new("A", 2000, Sex::Male, 2).with_age(AgeGroup::Years5To14),
            Record::new("A", 2000, Sex::Male, 3).with_age(AgeGroup::Years15To24),
            Record::new("A", 2001, Sex::Male, 4).with_age(AgeGroup::Years5To14),
        ])
        .unwrap();

        let by_age = Aggregator::totals_by_age(&t).unwrap();
        assert_eq!(by_age.labels(), vec!["5-14 years", "15-24 years", "75+ years"]);
        assert_eq!(by_age.values(), vec![6.0, 3.0, 1.0]);
    }

    #[test]
    fn test_generation_and_sex_pivot() {
        let t = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 3).with_generation("Silent"),
            Record::new("A", 2000, Sex::Female, 2).with_generation("Silent"),
            Record::new("B", 2000, Sex::Male, 7).with_generation("Boomers"),
            Record::new("B", 2001, Sex::Male, 1).with_generation("Boomers"),
        ])
        .unwrap();

        let agg = Aggregator::totals_by_generation_and_sex(&t).unwrap();
        assert_eq!(agg.labels(), vec!["Boomers / male", "Silent / female", "Silent / male"]);

        let pivot = Pivot::from_aggregate(&agg);
        assert_eq!(pivot.rows, vec!["Boomers", "Silent"]);
        assert_eq!(pivot.columns, vec!["female", "male"]);
        assert_eq!(pivot.cells, vec![vec![None, Some(8.0)], vec![Some(2.0), Some(3.0)]]);
        assert_eq!(pivot.max_value(), Some(8.0));
    }

    #[test]
    fn test_mean_rates() {
        let t = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 1).with_rate(2.0).with_hdi(0.5),
            Record::new("A", 2001, Sex::Male, 1).with_rate(4.0),
            Record::new("B", 2000, Sex::Male, 1).with_rate(9.0).with_hdi(0.6),
        ])
        .unwrap();

        let cleaned = DataCleaner::clean(&t).unwrap();
        assert_eq!(Aggregator::mean_rate_per_100k(&cleaned).unwrap(), Some(5.5));

        let by_country = Aggregator::mean_rate_by_country(&t).unwrap();
        assert_eq!(by_country.pairs(), vec![("A".to_string(), 3.0), ("B".to_string(), 9.0)]);
    }

    #[test]
    fn test_table_metadata() {
        let t = scenario();

        let shape = Aggregator::shape_info(&t);
        assert_eq!(shape.row_count, t.height());
        assert_eq!(shape.column_count, t.column_names().len());

        let missing = Aggregator::missing_value_counts(&t);
        // HDI is the only column left missing by `Record::new`
        for (column, count) in &missing {
            let expected = if column == "HDI for year" { 3 } else { 0 };
            assert_eq!(*count, expected, "{column}");
        }

        let complete = DataCleaner::clean(&countries()).unwrap();
        assert!(Aggregator::missing_value_counts(&complete).iter().all(|(_, c)| *c == 0));

        assert_eq!(Aggregator::year_range(&t).unwrap(), Some((2000, 2000)));
        assert_eq!(Aggregator::distinct_countries(&t).unwrap(), vec!["A", "B"]);
        assert_eq!(Aggregator::column_info(&t)[0].non_null, 3);
    }

    #[test]
    fn test_histogram_by_sex() {
        let hist = Aggregator::suicides_histogram_by_sex(&scenario(), 3).unwrap();
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[0].sex, "female");
        assert_eq!(hist[1].bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(hist[0].bins.len(), 3);
    }

    #[test]
    fn test_empty_table_yields_empty_aggregates() {
        let t = Table::from_records(&[]).unwrap();
        assert!(Aggregator::totals_by_sex(&t).unwrap().is_empty());
        assert!(Aggregator::totals_by_age(&t).unwrap().is_empty());
        assert!(Aggregator::top_n_countries_by_total(&t, 5, true).unwrap().is_empty());
        assert!(Aggregator::mean_rate_by_country(&t).unwrap().is_empty());
        assert!(Aggregator::totals_by_generation_and_sex(&t).unwrap().is_empty());
        assert_eq!(Aggregator::mean_rate_per_100k(&t).unwrap(), None);
        assert_eq!(Aggregator::year_range(&t).unwrap(), None);
        assert!(Aggregator::suicides_histogram_by_sex(&t, 30).unwrap().is_empty());
        assert!(matches!(
            Aggregator::time_series_for_country(&t, "A"),
            Err(AggregateError::EmptySelection(_))
        ));
    }
}
