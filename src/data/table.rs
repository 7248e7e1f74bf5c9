//! Case Table Module
//! Dense entity-by-date matrix shared by the cumulative and daily views.

use chrono::NaiveDate;
use std::ops::Range;

/// A dense table of counts, one row per entity, one column per date.
///
/// All entities share the same strictly increasing date axis. Values are
/// `i64` so the same type carries both cumulative counts and daily deltas,
/// which may be negative when the source publishes a correction. Built once
/// at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CaseTable {
    entities: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<i64>>,
}

impl CaseTable {
    /// Assemble a table from its parts. `dates` must already be sorted
    /// ascending without duplicates and every row must match its length.
    pub fn new(entities: Vec<String>, dates: Vec<NaiveDate>, rows: Vec<Vec<i64>>) -> Self {
        debug_assert_eq!(entities.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == dates.len()));
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self {
            entities,
            dates,
            rows,
        }
    }

    /// Entity names in table order (the ranking tie-break order).
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// The shared date axis, strictly increasing.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All value rows, indexed like `entities()`.
    pub fn rows(&self) -> &[Vec<i64>] {
        &self.rows
    }

    /// Row position of an entity name, if present.
    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e == name)
    }

    /// Value for one entity at one date index.
    pub fn value(&self, entity: usize, date_idx: usize) -> i64 {
        self.rows[entity][date_idx]
    }

    /// Contiguous index range of dates with `start <= d <= end`.
    ///
    /// An inverted or out-of-range window yields an empty range, never an
    /// error.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Range<usize> {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        lo..hi.max(lo)
    }
}
