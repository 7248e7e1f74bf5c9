//! Query module - filtering and ranking over the immutable tables

mod engine;

pub use engine::{
    EntitySeries, FilterQuery, QueryEngine, QueryError, QueryResult, SeriesPoint, TOP_N,
};
