//! Data module - CSV loading, schema and cleaning

mod cleaner;
mod loader;
pub mod schema;
mod table;

pub use cleaner::DataCleaner;
pub use loader::{DataLoadError, DataLoader};
pub use schema::{AgeGroup, Record, Sex};
pub use table::Table;
