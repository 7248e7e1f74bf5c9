//! Query Engine Module
//! Pure filtering and ranking over the cumulative and daily tables.

use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

use crate::data::CaseTable;

/// Number of entities in the ranked subset.
pub const TOP_N: usize = 5;

/// Date format accepted at the query boundary.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("Invalid date '{value}': {source}")]
    DateParse {
        value: String,
        source: chrono::ParseError,
    },
}

/// One filter selection: entity plus inclusive date window.
///
/// `start <= end` is not enforced; an inverted or out-of-range window
/// degrades to an empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub entity: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterQuery {
    pub fn new(entity: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            entity: entity.to_string(),
            start,
            end,
        }
    }

    /// Build a query from boundary strings (`YYYY-MM-DD`).
    ///
    /// A missing or empty bound selects the full range on that side.
    pub fn parse(
        entity: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, QueryError> {
        let start = match start {
            Some(s) if !s.trim().is_empty() => parse_query_date(s)?,
            _ => NaiveDate::MIN,
        };
        let end = match end {
            Some(s) if !s.trim().is_empty() => parse_query_date(s)?,
            _ => NaiveDate::MAX,
        };
        Ok(Self::new(entity, start, end))
    }
}

fn parse_query_date(value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value.trim(), QUERY_DATE_FORMAT).map_err(|source| {
        QueryError::DateParse {
            value: value.to_string(),
            source,
        }
    })
}

/// Ordered (date, value) points for a named entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySeries {
    pub entity: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: i64,
}

/// The four series collections produced for one filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub cumulative: EntitySeries,
    pub daily: EntitySeries,
    pub top_cumulative: Vec<EntitySeries>,
    pub top_daily: Vec<EntitySeries>,
}

impl QueryResult {
    fn empty(entity: &str) -> Self {
        Self {
            cumulative: EntitySeries {
                entity: entity.to_string(),
                points: Vec::new(),
            },
            daily: EntitySeries {
                entity: entity.to_string(),
                points: Vec::new(),
            },
            top_cumulative: Vec::new(),
            top_daily: Vec::new(),
        }
    }

    /// True when the filtered window contained no dates.
    pub fn is_empty(&self) -> bool {
        self.cumulative.points.is_empty()
    }
}

/// Evaluates filter selections against the immutable tables.
///
/// Pure: reads shared state only and allocates a fresh result per call, so
/// concurrent queries need no synchronization.
pub struct QueryEngine;

impl QueryEngine {
    /// Answer one filter selection.
    ///
    /// An empty window returns an all-empty result; an entity name not
    /// present in the table is a caller contract violation and fails.
    pub fn run(
        cumulative: &CaseTable,
        daily: &CaseTable,
        query: &FilterQuery,
    ) -> Result<QueryResult, QueryError> {
        let window = cumulative.window(query.start, query.end);
        if window.is_empty() {
            return Ok(QueryResult::empty(&query.entity));
        }

        let entity = cumulative
            .entity_index(&query.entity)
            .ok_or_else(|| QueryError::UnknownEntity(query.entity.clone()))?;

        let ranked = Self::rank_by_latest(cumulative, &window);

        Ok(QueryResult {
            cumulative: extract_series(cumulative, entity, &window),
            daily: extract_series(daily, entity, &window),
            top_cumulative: ranked
                .iter()
                .map(|&e| extract_series(cumulative, e, &window))
                .collect(),
            top_daily: ranked
                .iter()
                .map(|&e| extract_series(daily, e, &window))
                .collect(),
        })
    }

    /// Rank entities by cumulative value at the last date INSIDE the window
    /// (not the global last date), descending. The sort is stable so ties
    /// keep table order.
    fn rank_by_latest(cumulative: &CaseTable, window: &Range<usize>) -> Vec<usize> {
        let last = window.end - 1;
        let mut order: Vec<usize> = (0..cumulative.entities().len()).collect();
        order.sort_by_key(|&e| std::cmp::Reverse(cumulative.value(e, last)));
        order.truncate(TOP_N);
        order
    }
}

fn extract_series(table: &CaseTable, entity: usize, window: &Range<usize>) -> EntitySeries {
    let points = window
        .clone()
        .map(|t| SeriesPoint {
            date: table.dates()[t],
            value: table.value(entity, t),
        })
        .collect();
    EntitySeries {
        entity: table.entities()[entity].clone(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DeltaBuilder;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Six entities over three dates. At the last date the cumulative values
    /// are A:100, B:90, C:90, D:80, E:70, F:60; at the middle date F leads.
    fn tables() -> (CaseTable, CaseTable) {
        let cumulative = CaseTable::new(
            vec![
                "A".into(),
                "B".into(),
                "C".into(),
                "D".into(),
                "E".into(),
                "F".into(),
            ],
            vec![
                date("2020-01-22"),
                date("2020-01-23"),
                date("2020-01-24"),
            ],
            vec![
                vec![10, 50, 100],
                vec![20, 40, 90],
                vec![15, 30, 90],
                vec![5, 20, 80],
                vec![1, 10, 70],
                vec![55, 60, 60],
            ],
        );
        let daily = DeltaBuilder::build(&cumulative);
        (cumulative, daily)
    }

    fn full_query(entity: &str) -> FilterQuery {
        FilterQuery::new(entity, date("2020-01-22"), date("2020-01-24"))
    }

    #[test]
    fn top5_ranked_by_last_window_value_with_stable_ties() {
        let (cumulative, daily) = tables();
        let result = QueryEngine::run(&cumulative, &daily, &full_query("A")).unwrap();

        let ranked: Vec<&str> = result
            .top_cumulative
            .iter()
            .map(|s| s.entity.as_str())
            .collect();
        // B and C tie at 90; B precedes C because it comes first in the table.
        assert_eq!(ranked, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn ranking_reflects_the_filtered_window() {
        let (cumulative, daily) = tables();
        // Window ends at the middle date, where F (60) leads A (50).
        let query = FilterQuery::new("A", date("2020-01-22"), date("2020-01-23"));
        let result = QueryEngine::run(&cumulative, &daily, &query).unwrap();

        assert_eq!(result.top_cumulative[0].entity, "F");
        assert_eq!(result.top_cumulative.len(), TOP_N);
    }

    #[test]
    fn selected_entity_series_cover_the_window() {
        let (cumulative, daily) = tables();
        let result = QueryEngine::run(&cumulative, &daily, &full_query("B")).unwrap();

        assert_eq!(result.cumulative.entity, "B");
        assert_eq!(
            result.cumulative.points.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![20, 40, 90]
        );
        assert_eq!(
            result.daily.points.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![0, 20, 50]
        );
    }

    #[test]
    fn inverted_window_returns_all_empty() {
        let (cumulative, daily) = tables();
        let query = FilterQuery::new("A", date("2020-01-24"), date("2020-01-22"));
        let result = QueryEngine::run(&cumulative, &daily, &query).unwrap();

        assert!(result.is_empty());
        assert!(result.daily.points.is_empty());
        assert!(result.top_cumulative.is_empty());
        assert!(result.top_daily.is_empty());
    }

    #[test]
    fn out_of_range_window_returns_all_empty() {
        let (cumulative, daily) = tables();
        let query = FilterQuery::new("A", date("2021-01-01"), date("2021-12-31"));
        let result = QueryEngine::run(&cumulative, &daily, &query).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn unknown_entity_fails() {
        let (cumulative, daily) = tables();
        let err = QueryEngine::run(&cumulative, &daily, &full_query("Atlantis")).unwrap_err();
        assert!(matches!(err, QueryError::UnknownEntity(name) if name == "Atlantis"));
    }

    #[test]
    fn query_is_idempotent() {
        let (cumulative, daily) = tables();
        let first = QueryEngine::run(&cumulative, &daily, &full_query("C")).unwrap();
        let second = QueryEngine::run(&cumulative, &daily, &full_query("C")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_date_window_yields_single_points() {
        let (cumulative, daily) = tables();
        let query = FilterQuery::new("A", date("2020-01-23"), date("2020-01-23"));
        let result = QueryEngine::run(&cumulative, &daily, &query).unwrap();

        assert_eq!(result.cumulative.points.len(), 1);
        assert_eq!(result.cumulative.points[0].value, 50);
        assert_eq!(result.daily.points.len(), 1);
        assert_eq!(result.daily.points[0].value, 40);
        // Ranking uses that single date's values, where F leads.
        assert_eq!(result.top_cumulative[0].entity, "F");
        assert_eq!(result.top_cumulative[0].points.len(), 1);
    }

    #[test]
    fn parse_defaults_to_full_range() {
        let query = FilterQuery::parse("A", None, Some("")).unwrap();
        assert_eq!(query.start, NaiveDate::MIN);
        assert_eq!(query.end, NaiveDate::MAX);

        let (cumulative, daily) = tables();
        let result = QueryEngine::run(&cumulative, &daily, &query).unwrap();
        assert_eq!(result.cumulative.points.len(), 3);
    }

    #[test]
    fn malformed_date_fails_to_parse() {
        let err = FilterQuery::parse("A", Some("not-a-date"), None).unwrap_err();
        assert!(matches!(err, QueryError::DateParse { value, .. } if value == "not-a-date"));
    }
}
