//! CaseTrend - case-count time series aggregation and ranking engine
//!
//! Cleans a raw wide case-count table into an immutable cumulative table,
//! derives the daily-delta table once, and answers entity/date-range queries
//! with filtered and top-ranked series collections. Chart rendering and the
//! CLI are thin shims over the pure core.

pub mod charts;
pub mod data;
pub mod query;
pub mod stats;

pub use charts::ChartRenderer;
pub use data::{CaseTable, DataLoader};
pub use query::{FilterQuery, QueryEngine, QueryResult};
pub use stats::DeltaBuilder;
