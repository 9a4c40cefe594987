//! Reading and writing the CSV artifacts passed between stages.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, warn};

use crate::error::{Result, VidstatsError};
use crate::types::{infer_column, Table, Value};

/// Fail with `MissingArtifact` unless `path` exists.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(VidstatsError::MissingArtifact {
            path: path.to_path_buf(),
        })
    }
}

/// Parse CSV bytes with a header row into a [`Table`].
///
/// Repeated header names are renamed `name.1`, `name.2`, ... in order of
/// appearance. Short rows are padded with `Null`; a row with more fields than
/// the header is rejected. Cell types are inferred per column with
/// [`infer_column`].
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = dedupe_headers(headers);
    let width = columns.len();

    let mut records: Vec<StringRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > width {
            // +2: one for the header, one because records are 0-based.
            return Err(VidstatsError::Csv(format!(
                "line {} has {} fields, header has {}",
                idx + 2,
                record.len(),
                width
            )));
        }
        records.push(record);
    }

    let mut rows: Vec<Vec<Value>> = vec![Vec::with_capacity(width); records.len()];
    for col in 0..width {
        let fields: Vec<&str> = records.iter().map(|r| r.get(col).unwrap_or("")).collect();
        for (row, value) in rows.iter_mut().zip(infer_column(&fields)) {
            row.push(value);
        }
    }

    Ok(Table::from_rows(columns, rows))
}

/// Rename repeated header names so every column name is unique.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(headers.len());

    for original in headers {
        let mut name = original.clone();
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{name}.{count}");
            count = counts.get(&name).copied().unwrap_or(0);
        }
        if name != original {
            warn!(column = %original, renamed = %name, "Renaming duplicate column");
        }
        counts.insert(name.clone(), 1);
        unique.push(name);
    }
    unique
}

/// Read a CSV artifact from disk.
pub fn read_table(path: &Path) -> Result<Table> {
    ensure_exists(path)?;
    let bytes = std::fs::read(path)?;
    let table = parse_table(&bytes)?;
    debug!(path = %path.display(), rows = table.len(), "Artifact read");
    Ok(table)
}

/// Write a table to `path` as CSV, creating parent directories.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Value::to_field))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = table.len(), "Artifact written");
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
