//! Chart rendering with plotters' SVG backend.
//!
//! Each function takes already-queried rows and writes one file, replacing
//! any existing file at that path. Categorical axes are drawn on an `f64`
//! coordinate with one slot per row; the label formatters map slot centers
//! back to row labels.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use vidstats_storage::{CategoryRow, DailyTrendRow, TopVideoRow};

use crate::error::ReportError;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const LINE_COLOR: RGBColor = RGBColor(214, 39, 40);
const FONT: &str = "sans-serif";
const MAX_LABEL_CHARS: usize = 40;

fn chart_err<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Chart(err.to_string())
}

/// Horizontal bar chart of the most viewed videos, highest at the top.
pub fn top_videos_chart(
    rows: &[TopVideoRow],
    path: &Path,
    size: (u32, u32),
) -> Result<(), ReportError> {
    let n = rows.len();
    let max_views = rows.iter().map(|r| r.views).fold(0.0_f64, f64::max);
    // Headroom past the longest bar for its value label.
    let x_max = if max_views > 0.0 { max_views * 1.15 } else { 1.0 };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Top {n} Most Viewed Videos"), (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(size.0 / 3)
        .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))
        .map_err(chart_err)?;

    // Slot 0 is the bottom of the axis, so the first (highest) row sits in slot n-1.
    let row_in_slot = |y: f64| slot_index(y, n).map(|slot| &rows[n - 1 - slot]);
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y| {
            row_in_slot(*y)
                .map(|r| truncate_label(&r.title))
                .unwrap_or_default()
        })
        .x_label_formatter(&|x| format_count(*x))
        .x_desc("Views")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let y = (n - 1 - i) as f64;
            Rectangle::new([(0.0, y - 0.35), (row.views, y + 0.35)], BAR_COLOR.filled())
        }))
        .map_err(chart_err)?;

    let value_style = TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let y = (n - 1 - i) as f64;
            Text::new(format_count(row.views), (row.views * 1.01, y), value_style.clone())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!(path = %path.display(), bars = n, "Top videos chart rendered");
    Ok(())
}

/// Vertical bar chart of average views per category, in row order.
pub fn category_chart(
    rows: &[CategoryRow],
    path: &Path,
    size: (u32, u32),
) -> Result<(), ReportError> {
    let n = rows.len();
    let max_avg = rows.iter().map(|r| r.avg_views).fold(0.0_f64, f64::max);
    let y_max = if max_avg > 0.0 { max_avg * 1.1 } else { 1.0 };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Views by Category", (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| {
            slot_index(*x, n)
                .map(|slot| rows[slot].category_id.clone())
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| format_count(*y))
        .x_desc("Category ID")
        .y_desc("Average Views")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, row)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, row.avg_views)], BAR_COLOR.filled())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!(path = %path.display(), categories = n, "Category chart rendered");
    Ok(())
}

/// Line chart with markers of average views per publish date.
///
/// Rows whose `publish_date` is not a `YYYY-MM-DD` date are left out; if none
/// remain the chart is not written.
pub fn daily_trend_chart(
    rows: &[DailyTrendRow],
    path: &Path,
    size: (u32, u32),
) -> Result<(), ReportError> {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(&row.publish_date, "%Y-%m-%d").ok();
            if date.is_none() {
                debug!(publish_date = %row.publish_date, "Skipping unparseable publish date");
            }
            date.map(|d| (f64::from(d.num_days_from_ce()), row.avg_views))
        })
        .collect();

    if points.is_empty() {
        return Err(ReportError::Chart(
            "no rows with a parseable publish_date".to_string(),
        ));
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_peak = points.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    let y_max = if y_peak > 0.0 { y_peak * 1.1 } else { 1.0 };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Views Over Time", (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d((x_min - 0.5)..(x_max + 0.5), 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .x_labels(points.len().min(10))
        .x_label_formatter(&|x| format_day(*x))
        .y_label_formatter(&|y| format_count(*y))
        .x_desc("Publish Date")
        .y_desc("Average Views")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), LINE_COLOR.stroke_width(2)))
        .map_err(chart_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 4, LINE_COLOR.filled())),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!(path = %path.display(), points = points.len(), "Daily trend chart rendered");
    Ok(())
}

/// Map an axis value to its slot when it sits on a slot center.
fn slot_index(value: f64, slots: usize) -> Option<usize> {
    let rounded = value.round();
    if (value - rounded).abs() > 0.01 || rounded < 0.0 {
        return None;
    }
    let slot = rounded as usize;
    (slot < slots).then_some(slot)
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{head}…")
    }
}

fn format_day(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Round to a whole number and group thousands with commas.
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
