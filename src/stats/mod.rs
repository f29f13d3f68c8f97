//! Statistics module - Aggregations and descriptive statistics

mod aggregator;
mod calculator;

pub use aggregator::{
    Aggregate, AggregateError, Aggregator, ColumnInfo, EmptySelectionError, Pivot, SexHistogram,
    ShapeInfo,
};
pub use calculator::{ColumnSummary, CorrelationMatrix, HistogramBin, StatsCalculator};
