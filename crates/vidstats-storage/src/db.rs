//! Database connection management.
//!
//! Wraps a single rusqlite Connection. The load stage opens it read-write
//! (creating the file), the report stage opens it read-only.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use vidstats_core::error::VidstatsError;

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Creates the parent directory and configures the journal.
    pub fn open(path: &Path) -> Result<Self, VidstatsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| VidstatsError::Storage(format!("Failed to open database: {}", e)))?;

        // Rollback journal rather than WAL: read-only openers need no -shm file.
        conn.execute_batch(
            "PRAGMA journal_mode = DELETE;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| VidstatsError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an existing database without write access.
    ///
    /// Fails with `MissingArtifact` if the file does not exist.
    pub fn open_read_only(path: &Path) -> Result<Self, VidstatsError> {
        if !path.exists() {
            return Err(VidstatsError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| VidstatsError::Storage(format!("Failed to open database: {}", e)))?;

        info!("Database opened read-only at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, VidstatsError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| VidstatsError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Ok(Self { conn })
    }

    /// Execute a closure with a reference to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, VidstatsError>
    where
        F: FnOnce(&Connection) -> Result<T, VidstatsError>,
    {
        f(&self.conn)
    }

    /// Whether a table with this name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool, VidstatsError> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [name],
                    |row| row.get(0),
                )
                .map_err(|e| VidstatsError::Storage(e.to_string()))?;
            Ok(count > 0)
        })
    }

    /// Names of the indexes defined on a table, sorted.
    pub fn index_names(&self, table: &str) -> Result<Vec<String>, VidstatsError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'index' AND tbl_name = ?1
                     ORDER BY name",
                )
                .map_err(|e| VidstatsError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map([table], |row| row.get::<_, String>(0))
                .map_err(|e| VidstatsError::Storage(e.to_string()))?;

            let mut names = Vec::new();
            for row in rows {
                names.push(row.map_err(|e| VidstatsError::Storage(e.to_string()))?);
            }
            Ok(names)
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert!(!db.table_exists("video_stats").unwrap());
    }

    #[test]
    fn test_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("youtube.db");
        let db = Database::open(&path).unwrap();

        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER)")
                .map_err(|e| VidstatsError::Storage(e.to_string()))
        })
        .unwrap();

        assert!(path.exists());
        assert!(db.table_exists("t").unwrap());
    }

    #[test]
    fn test_rollback_journal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("journal.db")).unwrap();
        db.with_conn(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .map_err(|e| VidstatsError::Storage(e.to_string()))?;
            assert_eq!(mode, "delete");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_read_only_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Database::open_read_only(&dir.path().join("absent.db")).unwrap_err();
        assert!(err.is_missing_artifact());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        {
            let db = Database::open(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute_batch("CREATE TABLE t (x INTEGER)")
                    .map_err(|e| VidstatsError::Storage(e.to_string()))
            })
            .unwrap();
        }

        let db = Database::open_read_only(&path).unwrap();
        let result = db.with_conn(|conn| {
            conn.execute("INSERT INTO t (x) VALUES (1)", [])
                .map_err(|e| VidstatsError::Storage(e.to_string()))
        });
        assert!(result.is_err());
    }
}
