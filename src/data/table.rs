//! Table Module
//! Immutable wrapper around the loaded Polars DataFrame.

use super::schema::{
    Record, AGE, COUNTRY, GDP_FOR_YEAR, GDP_PER_CAPITA, GENERATION, HDI_FOR_YEAR, POPULATION,
    RATE_PER_100K, SEX, SUICIDES_NO, YEAR,
};
use polars::prelude::*;

/// The base dataset for one run. Never mutated after construction;
/// every derived view is a new `Table`.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
}

impl Table {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a table from typed records, in canonical column order.
    pub fn from_records(records: &[Record]) -> PolarsResult<Self> {
        let country: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
        let year: Vec<i64> = records.iter().map(|r| r.year).collect();
        let sex: Vec<&str> = records.iter().map(|r| r.sex.as_str()).collect();
        let age: Vec<&str> = records.iter().map(|r| r.age.label()).collect();
        let suicides: Vec<i64> = records.iter().map(|r| r.suicides_no).collect();
        let population: Vec<i64> = records.iter().map(|r| r.population).collect();
        let rate: Vec<f64> = records.iter().map(|r| r.suicides_per_100k).collect();
        let hdi: Vec<Option<f64>> = records.iter().map(|r| r.hdi_for_year).collect();
        let gdp: Vec<f64> = records.iter().map(|r| r.gdp_for_year).collect();
        let gdp_per_capita: Vec<f64> = records.iter().map(|r| r.gdp_per_capita).collect();
        let generation: Vec<&str> = records.iter().map(|r| r.generation.as_str()).collect();

        let df = DataFrame::new(vec![
            Column::new(COUNTRY.into(), country),
            Column::new(YEAR.into(), year),
            Column::new(SEX.into(), sex),
            Column::new(AGE.into(), age),
            Column::new(SUICIDES_NO.into(), suicides),
            Column::new(POPULATION.into(), population),
            Column::new(RATE_PER_100K.into(), rate),
            Column::new(HDI_FOR_YEAR.into(), hdi),
            Column::new(GDP_FOR_YEAR.into(), gdp),
            Column::new(GDP_PER_CAPITA.into(), gdp_per_capita),
            Column::new(GENERATION.into(), generation),
        ])?;

        Ok(Self::new(df))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Names of numeric columns, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Non-null values of a column as `f64`.
    pub fn f64_values(&self, column: &str) -> PolarsResult<Vec<f64>> {
        Ok(self.f64_options(column)?.into_iter().flatten().collect())
    }

    /// Column values as `f64`, keeping missing entries as `None`.
    pub fn f64_options(&self, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        let values = self.df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.df.equals_missing(&other.df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::Sex;

    #[test]
    fn test_from_records_layout() {
        let table = Table::from_records(&[
            Record::new("A", 2000, Sex::Male, 10).with_hdi(0.8),
            Record::new("B", 2001, Sex::Female, 3),
        ])
        .unwrap();

        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 11);
        assert_eq!(table.column_names()[0], COUNTRY);
        assert_eq!(
            table.numeric_columns(),
            vec![
                YEAR,
                SUICIDES_NO,
                POPULATION,
                RATE_PER_100K,
                HDI_FOR_YEAR,
                GDP_FOR_YEAR,
                GDP_PER_CAPITA
            ]
        );
        assert_eq!(table.f64_options(HDI_FOR_YEAR).unwrap(), vec![Some(0.8), None]);
        assert_eq!(table.f64_values(SUICIDES_NO).unwrap(), vec![10.0, 3.0]);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::from_records(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 11);
    }
}
