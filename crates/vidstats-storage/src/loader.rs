//! Replace-and-index loading of a cleaned table into `video_stats`.
//!
//! The destination table is dropped and recreated on every load, with column
//! types inferred from the cells. Indexes are created with `IF NOT EXISTS`
//! so repeated loads never fail on them.

use serde::Serialize;
use tracing::{debug, info};

use vidstats_core::error::VidstatsError;
use vidstats_core::types::{Table, Value};

use crate::db::Database;

/// Name of the single table the pipeline maintains.
pub const VIDEO_STATS_TABLE: &str = "video_stats";

/// Secondary indexes: (index name, column, always created).
const INDEXES: &[(&str, &str, bool)] = &[
    ("idx_video_id", "video_id", true),
    ("idx_publish_date", "publish_date", false),
    ("idx_category", "category_id", false),
];

/// SQLite storage class chosen for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Infer from cells: all integers → INTEGER, any real among numbers →
    /// REAL, any text or no values at all → TEXT.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<ColumnType> = None;
        for cell in cells {
            let cell_type = match cell {
                Value::Null => continue,
                Value::Integer(_) => ColumnType::Integer,
                Value::Real(_) => ColumnType::Real,
                Value::Text(_) => return ColumnType::Text,
            };
            inferred = Some(match (inferred, cell_type) {
                (Some(ColumnType::Real), _) | (_, ColumnType::Real) => ColumnType::Real,
                _ => ColumnType::Integer,
            });
        }
        inferred.unwrap_or(ColumnType::Text)
    }

    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Convert a cell to this column's storage class.
    fn to_sql_value(self, value: &Value) -> rusqlite::types::Value {
        use rusqlite::types::Value as Sql;
        match (self, value) {
            (_, Value::Null) => Sql::Null,
            (ColumnType::Integer, Value::Integer(i)) => Sql::Integer(*i),
            (ColumnType::Real, Value::Integer(i)) => Sql::Real(*i as f64),
            (ColumnType::Real, Value::Real(f)) => Sql::Real(*f),
            (_, other) => Sql::Text(other.to_string()),
        }
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Row count read back from the store after loading.
    pub rows_loaded: u64,
    /// Indexes ensured on the table, in creation order.
    pub indexes: Vec<String>,
}

/// Quote an identifier for use in SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace the contents of `video_stats` with `table` and build its indexes.
pub fn load_table(db: &Database, table: &Table) -> Result<LoadSummary, VidstatsError> {
    let column_types: Vec<ColumnType> = table
        .columns()
        .iter()
        .map(|name| ColumnType::infer(table.column_values(name)))
        .collect();

    db.with_conn(|conn| {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| VidstatsError::Storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}",
            quote_ident(VIDEO_STATS_TABLE)
        ))
        .map_err(|e| VidstatsError::Storage(format!("Failed to drop table: {}", e)))?;

        let column_defs: Vec<String> = table
            .columns()
            .iter()
            .zip(&column_types)
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql()))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(VIDEO_STATS_TABLE),
            column_defs.join(", ")
        ))
        .map_err(|e| VidstatsError::Storage(format!("Failed to create table: {}", e)))?;

        if !table.is_empty() {
            let placeholders: Vec<String> =
                (1..=table.columns().len()).map(|i| format!("?{i}")).collect();
            let column_list: Vec<String> =
                table.columns().iter().map(|c| quote_ident(c)).collect();
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_ident(VIDEO_STATS_TABLE),
                    column_list.join(", "),
                    placeholders.join(", ")
                ))
                .map_err(|e| VidstatsError::Storage(format!("Failed to prepare insert: {}", e)))?;

            for row in table.rows() {
                let values = row
                    .iter()
                    .zip(&column_types)
                    .map(|(value, ty)| ty.to_sql_value(value));
                stmt.execute(rusqlite::params_from_iter(values))
                    .map_err(|e| VidstatsError::Storage(format!("Failed to insert row: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| VidstatsError::Storage(format!("Failed to commit load: {}", e)))?;
        Ok(())
    })?;
    debug!(rows = table.len(), "Rows written to {}", VIDEO_STATS_TABLE);

    let rows_loaded = count_rows(db)?;
    info!(rows_loaded, "Loaded records into {}", VIDEO_STATS_TABLE);

    let indexes = create_indexes(db, table)?;
    Ok(LoadSummary {
        rows_loaded,
        indexes,
    })
}

/// `SELECT COUNT(*)` on `video_stats`.
pub fn count_rows(db: &Database) -> Result<u64, VidstatsError> {
    db.with_conn(|conn| {
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(VIDEO_STATS_TABLE)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| VidstatsError::Storage(format!("Failed to count rows: {}", e)))?;
        Ok(count as u64)
    })
}

fn create_indexes(db: &Database, table: &Table) -> Result<Vec<String>, VidstatsError> {
    info!("Creating indices");
    let mut created = Vec::new();
    for &(index, column, always) in INDEXES {
        if !always && !table.has_column(column) {
            debug!(column, "Column absent, skipping index {}", index);
            continue;
        }
        db.with_conn(|conn| {
            // Unquoted so a missing column is an error rather than a string literal.
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                index, VIDEO_STATS_TABLE, column
            ))
            .map_err(|e| VidstatsError::Storage(format!("Failed to create index {}: {}", index, e)))
        })?;
        created.push(index.to_string());
    }
    Ok(created)
}
