//! Suicide statistics dashboard: CSV loading, cleaning, aggregation and presentation.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod gui;
pub mod report;
pub mod selector;
pub mod stats;
