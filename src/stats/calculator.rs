//! Statistics Calculator Module
//! Descriptive statistics, Pearson correlation and histogram binning.

use crate::data::Table;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for one numeric column (pandas `describe` layout).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `values[i][j]` correlates `columns[i]` with `columns[j]`
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(column: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::empty(column);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ColumnSummary {
            column: column.to_string(),
            count: n,
            mean: values.iter().mean(),
            // sample standard deviation, NaN for a single value
            std: values.iter().std_dev(),
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Descriptive statistics of every numeric column, in column order.
    /// An empty table yields an empty list.
    pub fn summary_statistics(table: &Table) -> PolarsResult<Vec<ColumnSummary>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let columns = table
            .numeric_columns()
            .into_iter()
            .map(|name| {
                let values = table.f64_values(&name)?;
                Ok((name, values))
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(columns
            .par_iter()
            .map(|(name, values)| Self::describe(name, values))
            .collect())
    }

    /// Pearson correlation of two equally long samples.
    /// NaN when either side has fewer than two values or no variance.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        if xs.len() != ys.len() || xs.len() < 2 {
            return f64::NAN;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }

        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        r.clamp(-1.0, 1.0)
    }

    /// Correlation matrix over the numeric columns, using the rows where
    /// both columns of a pair are present.
    pub fn correlation_matrix(table: &Table) -> PolarsResult<CorrelationMatrix> {
        if table.is_empty() {
            return Ok(CorrelationMatrix::default());
        }

        let columns = table.numeric_columns();
        let data = columns
            .iter()
            .map(|name| table.f64_options(name))
            .collect::<PolarsResult<Vec<_>>>()?;

        let n = columns.len();
        let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect();

        let results: Vec<(usize, usize, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (xs, ys): (Vec<f64>, Vec<f64>) = data[i]
                    .iter()
                    .zip(data[j].iter())
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();

                let r = if i == j {
                    // exact unit diagonal whenever the column varies
                    if Self::pearson(&xs, &ys).is_nan() {
                        f64::NAN
                    } else {
                        1.0
                    }
                } else {
                    Self::pearson(&xs, &ys)
                };
                (i, j, r)
            })
            .collect();

        let mut values = vec![vec![f64::NAN; n]; n];
        for (i, j, r) in results {
            values[i][j] = r;
            values[j][i] = r;
        }

        Ok(CorrelationMatrix { columns, values })
    }

    /// Equal-width histogram over `[min, max]`; the last bin is closed.
    pub fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<HistogramBin> {
        if bins == 0 || !min.is_finite() || !max.is_finite() || min > max {
            return Vec::new();
        }

        // Degenerate range widens to one unit, as NumPy does
        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (hi - lo) / bins as f64;

        let mut result: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: lo + i as f64 * width,
                upper: if i + 1 == bins {
                    hi
                } else {
                    lo + (i + 1) as f64 * width
                },
                count: 0,
            })
            .collect();

        for &v in values {
            if v.is_nan() || v < lo || v > hi {
                continue;
            }
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            result[idx].count += 1;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Record, Sex};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_describe_matches_pandas() {
        let s = StatsCalculator::describe("x", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_close(s.mean, 2.5);
        assert_close(s.std, 1.2909944487358056);
        assert_close(s.min, 1.0);
        assert_close(s.q25, 1.75);
        assert_close(s.median, 2.5);
        assert_close(s.q75, 3.25);
        assert_close(s.max, 4.0);
    }

    #[test]
    fn test_describe_single_and_empty() {
        let s = StatsCalculator::describe("x", &[7.0]);
        assert_eq!(s.count, 1);
        assert!(s.std.is_nan());
        assert_close(s.median, 7.0);

        let e = StatsCalculator::describe("x", &[]);
        assert_eq!(e.count, 0);
        assert!(e.mean.is_nan());
    }

    #[test]
    fn test_pearson() {
        assert_close(StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0);
        assert_close(StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0);
        assert!(StatsCalculator::pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_correlation_matrix_symmetric_with_unit_diagonal() {
        let table = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 10).with_population(100).with_rate(1.0).with_hdi(0.5),
            Record::new("A", 2001, Sex::Female, 5).with_population(300).with_rate(4.0),
            Record::new("B", 2002, Sex::Male, 1).with_population(200).with_rate(2.5).with_hdi(0.7),
            Record::new("B", 2004, Sex::Female, 8).with_population(50).with_rate(9.0).with_hdi(0.6),
        ])
        .unwrap();

        let m = StatsCalculator::correlation_matrix(&table).unwrap();
        assert_eq!(m.columns, table.numeric_columns());

        for (i, column) in m.columns.iter().enumerate() {
            for j in 0..m.columns.len() {
                let (a, b) = (m.values[i][j], m.values[j][i]);
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
            let varies = StatsCalculator::describe(column, &table.f64_values(column).unwrap()).std > 0.0;
            if varies {
                assert_eq!(m.values[i][i], 1.0);
            }
        }

        // gdp columns are constant zero in these records
        assert!(m.get("gdp_per_capita ($)", "gdp_per_capita ($)").unwrap().is_nan());
        assert!(m.get("year", "suicides_no").unwrap().abs() <= 1.0);
    }

    #[test]
    fn test_summary_statistics_covers_numeric_columns() {
        let table = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 10),
            Record::new("B", 2002, Sex::Female, 20).with_hdi(0.5),
        ])
        .unwrap();

        let summary = StatsCalculator::summary_statistics(&table).unwrap();
        let names: Vec<&str> = summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, table.numeric_columns());

        let hdi = summary.iter().find(|s| s.column == "HDI for year").unwrap();
        assert_eq!(hdi.count, 1);
        let suicides = summary.iter().find(|s| s.column == "suicides_no").unwrap();
        assert_close(suicides.mean, 15.0);

        let empty = Table::from_records(&[]).unwrap();
        assert!(StatsCalculator::summary_statistics(&empty).unwrap().is_empty());
        assert!(StatsCalculator::correlation_matrix(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_histogram_bins() {
        let bins = StatsCalculator::histogram(&[0.0, 1.0, 2.0, 9.0, 10.0], 0.0, 10.0, 5);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 2]);
        assert_close(bins[4].upper, 10.0);

        let flat = StatsCalculator::histogram(&[3.0, 3.0], 3.0, 3.0, 2);
        assert_eq!(flat.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(StatsCalculator::histogram(&[1.0], 0.0, 1.0, 0).is_empty());
    }
}
