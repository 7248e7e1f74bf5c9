//! Derived Series Module
//! Builds the day-over-day delta table from the cumulative table.

use rayon::prelude::*;

use crate::data::CaseTable;

/// Computes the daily-delta table, once, from the cleaned cumulative table.
pub struct DeltaBuilder;

impl DeltaBuilder {
    /// First difference along the time axis for every entity.
    ///
    /// The first date's delta is fixed at zero since no prior value exists,
    /// which understates new cases on day one. Negative deltas (source data
    /// corrections) pass through unmodified.
    pub fn build(cumulative: &CaseTable) -> CaseTable {
        // Rows are independent, so diff them in parallel.
        let rows: Vec<Vec<i64>> = cumulative.rows().par_iter().map(|row| diff_row(row)).collect();

        CaseTable::new(
            cumulative.entities().to_vec(),
            cumulative.dates().to_vec(),
            rows,
        )
    }
}

fn diff_row(row: &[i64]) -> Vec<i64> {
    row.iter()
        .enumerate()
        .map(|(i, &v)| if i == 0 { 0 } else { v - row[i - 1] })
        .collect()
}
