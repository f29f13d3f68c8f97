//! Country Selector
//! The one user-driven parameter: which country the trend view shows.

use crate::data::Table;
use crate::stats::Aggregator;
use polars::prelude::PolarsResult;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Country '{0}' is not present in the dataset")]
    UnknownCountry(String),
}

/// Sorted distinct countries of the base table plus the current choice.
#[derive(Debug, Clone, Default)]
pub struct CountrySelector {
    countries: Vec<String>,
    selected: Option<usize>,
}

impl CountrySelector {
    pub fn new(table: &Table) -> PolarsResult<Self> {
        Ok(Self {
            countries: Aggregator::distinct_countries(table)?,
            selected: None,
        })
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// The chosen country, or the first one when nothing was chosen.
    pub fn selected(&self) -> Option<&str> {
        self.countries
            .get(self.selected.unwrap_or(0))
            .map(String::as_str)
    }

    /// Choose a country from the list. Unknown names leave the choice unchanged.
    pub fn choose(&mut self, country: &str) -> Result<(), SelectionError> {
        match self.countries.iter().position(|c| c == country) {
            Some(idx) => {
                self.selected = Some(idx);
                Ok(())
            }
            None => Err(SelectionError::UnknownCountry(country.to_string())),
        }
    }
}
