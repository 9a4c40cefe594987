//! Clean/transform stage.
//!
//! Every step is gated on the columns it needs, and the gates are
//! independent of each other: a source without `publish_time` still gets
//! numeric cleaning, and a source without `comment_count` still gets ratios.

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, info};

use vidstats_core::artifact::{read_table, write_table};
use vidstats_core::error::Result;
use vidstats_core::types::{Table, Value};

use crate::context::StageContext;

pub const PUBLISH_TIME: &str = "publish_time";
pub const NUMERIC_COLUMNS: [&str; 4] = ["views", "likes", "dislikes", "comment_count"];

const NORMALIZED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats carrying a UTC offset; parsed values are converted to UTC.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Read the staged artifact at `input`, clean it, and write it to `output`.
pub fn clean_transform(input: &Path, output: &Path, ctx: &StageContext) -> Result<Table> {
    ctx.in_scope(|| {
        info!("Reading ingested data from {}", input.display());
        let table = read_table(input)?;
        info!(rows = table.len(), "Successfully read records");

        let cleaned = transform_table(table);

        write_table(&cleaned, output)?;
        let (rows, columns) = cleaned.shape();
        info!(rows, columns, "Cleaned data saved to {}", output.display());
        Ok(cleaned)
    })
}

/// Apply the cleaning rules to an in-memory table.
pub fn transform_table(mut table: Table) -> Table {
    if table.has_column(PUBLISH_TIME) {
        derive_calendar_columns(&mut table);
        info!("Date columns processed");
    }

    for column in NUMERIC_COLUMNS {
        table.map_column(column, coerce_numeric);
    }

    if table.has_columns(&NUMERIC_COLUMNS) {
        let indices: Vec<usize> = NUMERIC_COLUMNS
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        let dropped = table.retain_rows(|row| indices.iter().all(|&i| !row[i].is_null()));
        info!(dropped, "Dropped rows with missing values in critical columns");
    }

    if table.has_columns(&["views", "likes", "dislikes"]) {
        add_engagement_ratios(&mut table);
        info!("Engagement metrics calculated");
    }

    table
}

fn derive_calendar_columns(table: &mut Table) {
    let parsed: Vec<Option<NaiveDateTime>> = table
        .column_values(PUBLISH_TIME)
        .map(parse_timestamp)
        .collect();

    let unparsed = parsed.iter().filter(|p| p.is_none()).count();
    if unparsed > 0 {
        debug!(unparsed, "Timestamps that could not be parsed were set to null");
    }

    let normalized = parsed
        .iter()
        .map(|p| to_value(p.map(|dt| dt.format(NORMALIZED_FORMAT).to_string())))
        .collect();
    let dates = parsed
        .iter()
        .map(|p| to_value(p.map(|dt| dt.date().format("%Y-%m-%d").to_string())))
        .collect();
    let hours = parsed
        .iter()
        .map(|p| to_value(p.map(|dt| i64::from(dt.hour()))))
        .collect();
    let weekdays = parsed
        .iter()
        .map(|p| to_value(p.map(|dt| i64::from(dt.weekday().num_days_from_monday()))))
        .collect();

    table.set_column(PUBLISH_TIME, normalized);
    table.set_column("publish_date", dates);
    table.set_column("publish_hour", hours);
    table.set_column("publish_day_of_week", weekdays);
}

trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

fn to_value<T: IntoValue>(value: Option<T>) -> Value {
    value.map_or(Value::Null, IntoValue::into_value)
}

/// Parse a timestamp cell. Offset-aware inputs are converted to UTC.
fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let raw = match value {
        Value::Null => return None,
        other => other.to_field(),
    };
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Missing becomes zero; text that is not a number becomes missing.
fn coerce_numeric(value: &Value) -> Value {
    match value {
        Value::Null => Value::Integer(0),
        Value::Integer(_) | Value::Real(_) => value.clone(),
        Value::Text(s) => Value::parse_number(s.trim()).unwrap_or(Value::Null),
    }
}

fn add_engagement_ratios(table: &mut Table) {
    let mut engagement = Vec::with_capacity(table.len());
    let mut like = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let number = |column: &str| table.get(row, column).and_then(Value::as_f64);
        let (views, likes, dislikes) = (number("views"), number("likes"), number("dislikes"));

        engagement.push(ratio(
            likes.zip(dislikes).map(|(l, d)| l + d),
            views,
        ));
        like.push(ratio(likes, likes.zip(dislikes).map(|(l, d)| l + d)));
    }

    table.set_column("engagement_ratio", engagement);
    table.set_column("like_ratio", like);
}

/// `numerator / denominator`, or `Null` when either is missing or the denominator is zero.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Value {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Value::Real(n / d),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Stage;
    use vidstats_core::artifact::parse_table;

    fn table(csv: &str) -> Table {
        parse_table(csv.as_bytes()).unwrap()
    }

    fn real(value: Option<&Value>) -> f64 {
        value.and_then(Value::as_f64).unwrap()
    }

    #[test]
    fn test_calendar_columns_derived() {
        let out = transform_table(table(
            "video_id,publish_time\n\
             a,2017-11-13T17:13:01.000Z\n\
             b,2018-01-07 23:30:00\n",
        ));

        assert_eq!(
            out.get(0, "publish_time"),
            Some(&Value::Text("2017-11-13 17:13:01".into()))
        );
        assert_eq!(out.get(0, "publish_date"), Some(&Value::Text("2017-11-13".into())));
        assert_eq!(out.get(0, "publish_hour"), Some(&Value::Integer(17)));
        // 2017-11-13 was a Monday.
        assert_eq!(out.get(0, "publish_day_of_week"), Some(&Value::Integer(0)));
        // 2018-01-07 was a Sunday.
        assert_eq!(out.get(1, "publish_day_of_week"), Some(&Value::Integer(6)));
    }

    #[test]
    fn test_offset_timestamps_converted_to_utc() {
        let out = transform_table(table("publish_time\n2018-01-01T23:30:00-02:00\n"));
        assert_eq!(
            out.get(0, "publish_time"),
            Some(&Value::Text("2018-01-02 01:30:00".into()))
        );
        assert_eq!(out.get(0, "publish_date"), Some(&Value::Text("2018-01-02".into())));
        assert_eq!(out.get(0, "publish_hour"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_unparseable_timestamp_is_null() {
        let out = transform_table(table("publish_time\nyesterday\n2018-02-03\n"));
        assert_eq!(out.get(0, "publish_time"), Some(&Value::Null));
        assert_eq!(out.get(0, "publish_date"), Some(&Value::Null));
        assert_eq!(out.get(1, "publish_hour"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_no_publish_time_means_no_calendar_columns() {
        let out = transform_table(table("video_id,views\na,5\n"));
        assert!(!out.has_column("publish_date"));
        assert!(!out.has_column("publish_hour"));
        assert!(!out.has_column("publish_day_of_week"));
    }

    #[test]
    fn test_missing_numeric_filled_with_zero() {
        let out = transform_table(table(
            "video_id,views,likes,dislikes,comment_count\na,,3,,NA\n",
        ));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "views"), Some(&Value::Integer(0)));
        assert_eq!(out.get(0, "dislikes"), Some(&Value::Integer(0)));
        assert_eq!(out.get(0, "comment_count"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_non_numeric_rows_dropped() {
        let out = transform_table(table(
            "video_id,views,likes,dislikes,comment_count\n\
             a,100,10,1,5\n\
             b,lots,10,1,5\n\
             c,200,20,2,many\n\
             d,300.5,30,3,6\n",
        ));
        let ids: Vec<String> = out.column_values("video_id").map(Value::to_field).collect();
        assert_eq!(ids, vec!["a", "d"]);
        for column in NUMERIC_COLUMNS {
            assert!(out.column_values(column).all(|v| !v.is_null()));
        }
    }

    #[test]
    fn test_without_comment_count_rows_kept() {
        let out = transform_table(table("video_id,views,likes,dislikes\na,oops,1,1\n"));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "views"), Some(&Value::Null));
        // The ratios are still computed; the missing operand makes engagement null.
        assert_eq!(out.get(0, "engagement_ratio"), Some(&Value::Null));
        assert!((real(out.get(0, "like_ratio")) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ratios() {
        let out = transform_table(table(
            "video_id,views,likes,dislikes,comment_count\n\
             a,100,0,0,0\n\
             b,0,5,5,0\n\
             c,200,30,10,0\n",
        ));

        // No reactions: engagement is zero, like ratio undefined.
        assert_eq!(out.get(0, "engagement_ratio"), Some(&Value::Real(0.0)));
        assert_eq!(out.get(0, "like_ratio"), Some(&Value::Null));
        // No views: engagement undefined.
        assert_eq!(out.get(1, "engagement_ratio"), Some(&Value::Null));
        assert!((real(out.get(1, "like_ratio")) - 0.5).abs() < 1e-12);

        assert!((real(out.get(2, "engagement_ratio")) - 0.2).abs() < 1e-12);
        assert!((real(out.get(2, "like_ratio")) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ratios_need_all_three_columns() {
        let out = transform_table(table("video_id,views,likes\na,100,5\n"));
        assert!(!out.has_column("engagement_ratio"));
        assert!(!out.has_column("like_ratio"));
    }

    #[test]
    fn test_clean_transform_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ingested.csv");
        let output = dir.path().join("out").join("cleaned.csv");
        std::fs::write(
            &input,
            "video_id,views,likes,dislikes,comment_count\na,100,0,0,1\n",
        )
        .unwrap();

        let cleaned =
            clean_transform(&input, &output, &StageContext::standalone(Stage::Clean)).unwrap();
        assert_eq!(cleaned.len(), 1);

        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("video_id,views,likes,dislikes,comment_count,engagement_ratio,like_ratio")
        );
        assert_eq!(lines.next(), Some("a,100,0,0,1,0,"));
    }

    #[test]
    fn test_clean_transform_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cleaned.csv");
        let err = clean_transform(
            &dir.path().join("ingested.csv"),
            &output,
            &StageContext::standalone(Stage::Clean),
        )
        .unwrap_err();
        assert!(err.is_missing_artifact());
        assert!(!output.exists());
    }
}
