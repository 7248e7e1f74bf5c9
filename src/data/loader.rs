//! CSV Dataset Loader Module
//! Loads the raw case-count CSV and cleans it into a dense CaseTable using Polars.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::data::CaseTable;

/// Entity label column in the Johns Hopkins global time-series layout.
pub const DEFAULT_ENTITY_COLUMN: &str = "Country/Region";

/// Header formats accepted for value columns.
const HEADER_DATE_FORMATS: [&str; 3] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Entity column '{0}' not found")]
    MissingEntityColumn(String),
    #[error("No usable data after cleaning")]
    EmptyDataset,
}

/// Cleans the raw wide table into the cumulative case table.
///
/// Sub-region rows are summed into their entity's totals, non-date columns
/// are dropped, and the date axis is normalized to a strictly increasing
/// sequence shared by every entity.
pub struct DataLoader {
    entity_col: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            entity_col: DEFAULT_ENTITY_COLUMN.to_string(),
        }
    }

    /// Use a different column as the entity label.
    pub fn with_entity_column(mut self, column: &str) -> Self {
        self.entity_col = column.to_string();
        self
    }

    /// Load a CSV file using Polars and clean it into a CaseTable.
    pub fn load_csv(&self, file_path: &str) -> Result<CaseTable, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        self.from_dataframe(&df)
    }

    /// Clean an already-loaded DataFrame into a CaseTable.
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<CaseTable, LoaderError> {
        if df.height() == 0 {
            return Err(LoaderError::EmptyDataset);
        }

        let entity_series = df
            .column(&self.entity_col)
            .map_err(|_| LoaderError::MissingEntityColumn(self.entity_col.clone()))?;

        // Classify columns: the entity label stays, parseable date headers
        // become the time axis, everything else (sub-region, coordinates,
        // corrupt headers) is dropped rather than given a sentinel date.
        let mut date_cols: Vec<(NaiveDate, String)> = Vec::new();
        let mut dropped = 0usize;
        for name in df.get_column_names() {
            if name.as_str() == self.entity_col {
                continue;
            }
            match parse_header_date(name.as_str()) {
                Some(d) => date_cols.push((d, name.to_string())),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(dropped, "dropped non-date columns");
        }
        if date_cols.is_empty() {
            return Err(LoaderError::EmptyDataset);
        }

        // Normalize the axis: sorted ascending, first occurrence wins on
        // duplicate headers so the axis stays strictly increasing.
        date_cols.sort_by_key(|(d, _)| *d);
        date_cols.dedup_by_key(|(d, _)| *d);

        // Materialize each retained column as i64; missing cells count as zero.
        let mut columns: Vec<Int64Chunked> = Vec::with_capacity(date_cols.len());
        for (_, name) in &date_cols {
            let col = df.column(name)?.cast(&DataType::Int64)?;
            columns.push(col.i64()?.clone());
        }

        // Group rows by entity label and sum column-wise; sub-regions roll
        // up into entity totals. BTreeMap keeps entities sorted.
        let mut grouped: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for i in 0..df.height() {
            let Ok(label) = entity_series.get(i) else {
                continue;
            };
            if label.is_null() {
                continue;
            }
            let label = label.to_string().trim_matches('"').to_string();
            let totals = grouped
                .entry(label)
                .or_insert_with(|| vec![0; date_cols.len()]);
            for (j, col) in columns.iter().enumerate() {
                totals[j] += col.get(i).unwrap_or(0);
            }
        }
        if grouped.is_empty() {
            return Err(LoaderError::EmptyDataset);
        }

        let dates: Vec<NaiveDate> = date_cols.iter().map(|(d, _)| *d).collect();
        let (entities, rows): (Vec<String>, Vec<Vec<i64>>) = grouped.into_iter().unzip();
        Ok(CaseTable::new(entities, dates, rows))
    }
}

/// Parse a value-column header into a calendar date.
fn parse_header_date(header: &str) -> Option<NaiveDate> {
    let header = header.trim();
    HEADER_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(header, fmt).ok())
}
