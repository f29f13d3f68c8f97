//! Data Cleaner Module
//! Derives the HDI-complete view of a table.

use super::schema::HDI_FOR_YEAR;
use super::table::Table;
use polars::prelude::*;

pub struct DataCleaner;

impl DataCleaner {
    /// Rows whose `HDI for year` is present, in their original order.
    /// The input table is left untouched.
    pub fn clean(table: &Table) -> PolarsResult<Table> {
        let cleaned = table
            .frame()
            .clone()
            .lazy()
            .filter(col(HDI_FOR_YEAR).is_not_null())
            .collect()?;

        log::debug!(
            "Cleaner dropped {} of {} rows without {}",
            table.height() - cleaned.height(),
            table.height(),
            HDI_FOR_YEAR
        );
        Ok(Table::new(cleaned))
    }
}
