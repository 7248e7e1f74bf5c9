//! Static Chart Renderer
//! Draws one query result as a four-panel dashboard image with plotters.
//!
//! Layout (2x2):
//! 1. Cumulative cases for the selected entity (line)
//! 2. Daily new cases for the selected entity (bars)
//! 3. Top 5 entities by cumulative cases (multi-line, legend)
//! 4. Top 5 entities, daily new cases (multi-line, legend)

use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

use crate::query::{EntitySeries, QueryResult};

/// Color for the selected entity's own panels.
pub const PRIMARY_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

/// Color palette for the ranked multi-series panels.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render chart: {0}")]
    Draw(String),
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders a QueryResult as a static dashboard image.
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self {
            width: 1600,
            height: 1000,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Render the four result series as a 2x2 dashboard PNG.
    pub fn render_png(&self, result: &QueryResult, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let panels = root.split_evenly((2, 2));

        Self::draw_line_panel(
            &panels[0],
            &format!("Cumulative cases: {}", result.cumulative.entity),
            std::slice::from_ref(&result.cumulative),
            false,
        )?;
        Self::draw_bar_panel(
            &panels[1],
            &format!("Daily new cases: {}", result.daily.entity),
            &result.daily,
        )?;
        Self::draw_line_panel(
            &panels[2],
            "Top 5 by cumulative cases",
            &result.top_cumulative,
            true,
        )?;
        Self::draw_line_panel(
            &panels[3],
            "Top 5, daily new cases",
            &result.top_daily,
            true,
        )?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    fn draw_line_panel(
        area: &Panel,
        title: &str,
        series: &[EntitySeries],
        with_legend: bool,
    ) -> Result<(), RenderError> {
        let Some((x_range, y_range)) = plot_ranges(series) else {
            return draw_placeholder(area, title);
        };

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_labels(6)
            .y_labels(6)
            .draw()
            .map_err(draw_err)?;

        for (i, s) in series.iter().enumerate() {
            let color = if with_legend {
                PALETTE[i % PALETTE.len()]
            } else {
                PRIMARY_COLOR
            };
            let anno = chart
                .draw_series(LineSeries::new(
                    s.points.iter().map(|p| (p.date, p.value)),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?;
            if with_legend {
                // Entity names are the legend keys of the ranked panels.
                anno.label(s.entity.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
            }
        }

        if with_legend {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw_bar_panel(area: &Panel, title: &str, series: &EntitySeries) -> Result<(), RenderError> {
        let Some((x_range, y_range)) = plot_ranges(std::slice::from_ref(series)) else {
            return draw_placeholder(area, title);
        };

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(34)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_labels(6)
            .y_labels(6)
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(series.points.iter().map(|p| {
                // One bar per day, spanning [date, date+1).
                Rectangle::new(
                    [(p.date, 0), (p.date + Duration::days(1), p.value)],
                    PRIMARY_COLOR.filled(),
                )
            }))
            .map_err(draw_err)?;
        Ok(())
    }
}

/// Inclusive data bounds expanded into drawable axis ranges. None when the
/// series carry no points (empty query window).
fn plot_ranges(series: &[EntitySeries]) -> Option<(Range<NaiveDate>, Range<i64>)> {
    let mut bounds: Option<(NaiveDate, NaiveDate, i64, i64)> = None;
    for p in series.iter().flat_map(|s| &s.points) {
        bounds = Some(match bounds {
            None => (p.date, p.date, p.value, p.value),
            Some((d0, d1, v0, v1)) => (
                d0.min(p.date),
                d1.max(p.date),
                v0.min(p.value),
                v1.max(p.value),
            ),
        });
    }
    let (d0, d1, v0, v1) = bounds?;

    // Anchor the value axis at zero unless deltas go negative, and pad the
    // top so lines stay off the frame.
    let lo = v0.min(0);
    let pad = ((v1 - lo) / 20).max(1);
    Some((d0..d1 + Duration::days(1), lo..v1 + pad))
}

fn draw_placeholder(area: &Panel, title: &str) -> Result<(), RenderError> {
    area.draw(&Text::new(
        format!("{title} - no data in the selected window"),
        (20, 30),
        ("sans-serif", 18),
    ))
    .map_err(draw_err)?;
    Ok(())
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SeriesPoint;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(values: &[(NaiveDate, i64)]) -> EntitySeries {
        EntitySeries {
            entity: "Xland".into(),
            points: values
                .iter()
                .map(|&(date, value)| SeriesPoint { date, value })
                .collect(),
        }
    }

    #[test]
    fn empty_series_have_no_ranges() {
        assert!(plot_ranges(&[series(&[])]).is_none());
        assert!(plot_ranges(&[]).is_none());
    }

    #[test]
    fn ranges_cover_data_and_anchor_at_zero() {
        let s = series(&[(date("2020-01-22"), 5), (date("2020-01-24"), 40)]);
        let (x, y) = plot_ranges(std::slice::from_ref(&s)).unwrap();
        assert_eq!(x.start, date("2020-01-22"));
        assert_eq!(x.end, date("2020-01-25"));
        assert_eq!(y.start, 0);
        assert!(y.end > 40);
    }

    #[test]
    fn ranges_extend_below_zero_for_negative_deltas() {
        let s = series(&[(date("2020-01-22"), -3), (date("2020-01-23"), 7)]);
        let (_, y) = plot_ranges(std::slice::from_ref(&s)).unwrap();
        assert_eq!(y.start, -3);
    }
}
