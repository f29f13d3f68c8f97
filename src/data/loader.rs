//! CSV Data Loader Module
//! Reads the suicide statistics file with Polars and coerces it to the dataset schema.

use super::schema::{column_spec, AgeGroup, ColumnKind, ColumnSpec, Sex, SCHEMA};
use super::table::Table;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Unexpected column '{0}'")]
    UnknownColumn(String),
    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("Row {row}, column '{column}': cannot read '{value}' ({reason})")]
    Coercion {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load and type the dataset at `path`.
    ///
    /// The file handle is moved into the CSV reader and closed when parsing
    /// returns, on success and on error alike.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Table, DataLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // Read every column as text; coercion happens against the schema below
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(file)
            .finish()?;

        let table = Self::coerce_frame(&raw)?;
        log::info!(
            "Loaded {} rows, {} columns from {}",
            table.height(),
            table.width(),
            path.display()
        );
        Ok(table)
    }

    /// Check the header against the schema and type every column.
    pub fn coerce_frame(raw: &DataFrame) -> Result<Table, DataLoadError> {
        let mut by_name: HashMap<&'static str, &Column> = HashMap::new();

        for column in raw.get_columns() {
            let name = column.name().trim();
            if let Some(base) = duplicated_base(name) {
                return Err(DataLoadError::DuplicateColumn(base.to_string()));
            }
            let spec = column_spec(name)
                .ok_or_else(|| DataLoadError::UnknownColumn(name.to_string()))?;
            if by_name.insert(spec.name, column).is_some() {
                return Err(DataLoadError::DuplicateColumn(name.to_string()));
            }
        }

        let mut columns = Vec::with_capacity(by_name.len());
        for spec in SCHEMA.iter() {
            match by_name.get(spec.name) {
                Some(column) => columns.push(Self::coerce_column(spec, column)?),
                None if spec.required => {
                    return Err(DataLoadError::MissingColumn(spec.name.to_string()))
                }
                None => {}
            }
        }

        Ok(Table::new(DataFrame::new(columns)?))
    }

    fn coerce_column(spec: &ColumnSpec, column: &Column) -> Result<Column, DataLoadError> {
        let text = column.cast(&DataType::String)?;
        let values = text.str()?;
        let name: PlSmallStr = spec.name.into();

        let fail = |row: usize, value: &str, reason: String| DataLoadError::Coercion {
            column: spec.name.to_string(),
            row: row + 1,
            value: value.to_string(),
            reason,
        };

        let column = match spec.kind {
            ColumnKind::Text => {
                let parsed: Vec<Option<&str>> = values
                    .into_iter()
                    .map(|v| v.map(str::trim).filter(|s| !is_missing(s)))
                    .collect();
                Column::new(name, parsed)
            }
            ColumnKind::Sex => {
                let mut parsed: Vec<Option<&'static str>> = Vec::with_capacity(values.len());
                for (row, value) in values.into_iter().enumerate() {
                    parsed.push(match present(value) {
                        Some(s) => Some(s.parse::<Sex>().map_err(|e| fail(row, s, e))?.as_str()),
                        None => None,
                    });
                }
                Column::new(name, parsed)
            }
            ColumnKind::Age => {
                let mut parsed: Vec<Option<&'static str>> = Vec::with_capacity(values.len());
                for (row, value) in values.into_iter().enumerate() {
                    parsed.push(match present(value) {
                        Some(s) => Some(s.parse::<AgeGroup>().map_err(|e| fail(row, s, e))?.label()),
                        None => None,
                    });
                }
                Column::new(name, parsed)
            }
            ColumnKind::Count | ColumnKind::Integer => {
                let non_negative = spec.kind == ColumnKind::Count;
                let mut parsed: Vec<Option<i64>> = Vec::with_capacity(values.len());
                for (row, value) in values.into_iter().enumerate() {
                    parsed.push(match present(value) {
                        Some(s) => {
                            let n = s.parse::<i64>().map_err(|e| fail(row, s, e.to_string()))?;
                            if non_negative && n < 0 {
                                return Err(fail(row, s, "negative count".to_string()));
                            }
                            Some(n)
                        }
                        None => None,
                    });
                }
                Column::new(name, parsed)
            }
            ColumnKind::Rate | ColumnKind::Real | ColumnKind::GroupedReal => {
                let mut parsed: Vec<Option<f64>> = Vec::with_capacity(values.len());
                for (row, value) in values.into_iter().enumerate() {
                    parsed.push(match present(value) {
                        Some(s) => {
                            let x = parse_real(s, spec.kind).map_err(|e| fail(row, s, e))?;
                            if spec.kind == ColumnKind::Rate && x < 0.0 {
                                return Err(fail(row, s, "negative rate".to_string()));
                            }
                            Some(x)
                        }
                        None => None,
                    });
                }
                Column::new(name, parsed)
            }
        };

        Ok(column)
    }
}

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na")
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !is_missing(s))
}

fn parse_real(s: &str, kind: ColumnKind) -> Result<f64, String> {
    let parsed = if kind == ColumnKind::GroupedReal {
        s.replace(',', "").parse::<f64>()
    } else {
        s.parse::<f64>()
    };
    let x = parsed.map_err(|e| e.to_string())?;

    if x.is_finite() {
        Ok(x)
    } else {
        Err("not a finite number".to_string())
    }
}

/// Polars renames a repeated header to `<name>_duplicated_<n>`; recover `<name>`
/// when it belongs to the schema.
fn duplicated_base(name: &str) -> Option<&str> {
    let (base, n) = name.rsplit_once("_duplicated_")?;
    let base = base.trim();
    (!n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) && column_spec(base).is_some())
        .then_some(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{COUNTRY_YEAR, GDP_FOR_YEAR, HDI_FOR_YEAR, SEX};
    use std::io::Write;

    const HEADER: &str = "country,year,sex,age,suicides_no,population,suicides/100k pop,\
country-year,HDI for year, gdp_for_year ($) ,gdp_per_capita ($),generation";

    fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("master.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_published_layout() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
Albania,1987,male,15-24 years,21,312900,6.71,Albania1987,,\"2,156,624,900\",796,Generation X\n\
Albania,1987,female,75+ years,1,35600,2.81,Albania1987,0.61,\"2,156,624,900\",796,G.I. Generation\n"
        );
        let path = write_csv(&dir, &body);

        let table = DataLoader::load_csv(&path).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 12);
        assert!(table.column_names().contains(&COUNTRY_YEAR.to_string()));
        assert_eq!(
            table.f64_options(HDI_FOR_YEAR).unwrap(),
            vec![None, Some(0.61)]
        );
        assert_eq!(
            table.f64_values(GDP_FOR_YEAR).unwrap(),
            vec![2_156_624_900.0, 2_156_624_900.0]
        );
        let sexes: Vec<Option<&str>> = table.frame().column(SEX).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(sexes, vec![Some("male"), Some("female")]);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLoader::load_csv(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn test_header_mismatch_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "country,year,sex\nAlbania,1987,male\n");
        let err = DataLoader::load_csv(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn(_)));

        let path = write_csv(&dir, &format!("{HEADER},extra\n"));
        let err = DataLoader::load_csv(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownColumn(ref c) if c == "extra"));
    }

    #[test]
    fn test_repeated_header_is_duplicate_column() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER},country\n\
Albania,1987,male,15-24 years,21,312900,6.71,Albania1987,,\"1,000\",796,Generation X,Albania\n"
        );
        let path = write_csv(&dir, &body);
        let err = DataLoader::load_csv(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(ref c) if c == "country"));

        let path = write_csv(&dir, &format!("{HEADER}, gdp_per_capita ($)\n"));
        let err = DataLoader::load_csv(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(ref c) if c == "gdp_per_capita ($)"));
    }

    #[test]
    fn test_duplicated_base_only_matches_schema_columns() {
        assert_eq!(duplicated_base("country_duplicated_0"), Some("country"));
        assert_eq!(duplicated_base("country_duplicated_x"), None);
        assert_eq!(duplicated_base("extra_duplicated_1"), None);
        assert_eq!(duplicated_base("country"), None);
    }

    #[test]
    fn test_bad_value_names_row_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
Albania,1987,male,15-24 years,-3,312900,6.71,Albania1987,,\"1,000\",796,Generation X\n"
        );
        let path = write_csv(&dir, &body);

        match DataLoader::load_csv(&path).unwrap_err() {
            DataLoadError::Coercion { column, row, .. } => {
                assert_eq!(column, "suicides_no");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_infinite_rate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
Albania,1987,male,15-24 years,21,312900,6.71,Albania1987,,\"1,000\",796,Generation X\n\
Albania,1988,male,15-24 years,21,312900,inf,Albania1988,,\"1,000\",796,Generation X\n"
        );
        let path = write_csv(&dir, &body);

        match DataLoader::load_csv(&path).unwrap_err() {
            DataLoadError::Coercion { column, row, value, .. } => {
                assert_eq!(column, "suicides/100k pop");
                assert_eq!(row, 2);
                assert_eq!(value, "inf");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_country_year_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let body = "country,year,sex,age,suicides_no,population,suicides/100k pop,\
HDI for year,gdp_for_year ($),gdp_per_capita ($),generation\n\
Albania,1987,male,5-14 years,0,10,0.0,,100,796,Generation Z\n";
        let path = write_csv(&dir, body);

        let table = DataLoader::load_csv(&path).unwrap();
        assert_eq!(table.width(), 11);
        assert_eq!(table.height(), 1);
    }
}
