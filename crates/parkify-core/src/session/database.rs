//! SQLite record store

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::store::RecordStore;
use crate::error::{self, ParkingError};
use crate::ParkingSession;

/// SQLite database holding the `parking` table
pub struct SqliteStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

/// Raw row as stored, before timestamp parsing
type SessionRow = (i64, String, String);

impl SqliteStore {
    /// Open or create a database at the specified path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(&db_path)
            .context(format!("Failed to open database at {}", db_path.display()))?;

        let store = Self {
            conn,
            db_path: Some(db_path),
        };
        store.initialize_schema()?;

        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self {
            conn,
            db_path: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS parking (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_no TEXT NOT NULL UNIQUE COLLATE NOCASE
                    CHECK (length(vehicle_no) <= 10),
                registration_time TEXT NOT NULL
            );
            "#,
            )
            .context("Failed to initialize database schema")?;

        Ok(())
    }

    /// Get the database file path (`None` when in memory)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }

    fn into_session(
        (id, vehicle_number, registration_time): SessionRow,
    ) -> error::Result<ParkingSession> {
        let entry_time = DateTime::parse_from_rfc3339(&registration_time)
            .map_err(|e| {
                ParkingError::StoreUnavailable(format!(
                    "invalid timestamp '{}' for session {}: {}",
                    registration_time, id, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(ParkingSession {
            id,
            vehicle_number,
            entry_time,
        })
    }
}

impl RecordStore for SqliteStore {
    fn insert(
        &self,
        vehicle_number: &str,
        entry_time: DateTime<Utc>,
    ) -> error::Result<ParkingSession> {
        let result = self.conn.execute(
            "INSERT INTO parking (vehicle_no, registration_time) VALUES (?1, ?2)",
            params![vehicle_number, entry_time.to_rfc3339()],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(ParkingError::DuplicateEntry(vehicle_number.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Inserted session {} for {}", id, vehicle_number);

        Ok(ParkingSession {
            id,
            vehicle_number: vehicle_number.to_string(),
            entry_time,
        })
    }

    fn delete(&self, id: i64) -> error::Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM parking WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    fn get(&self, id: i64) -> error::Result<Option<ParkingSession>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, vehicle_no, registration_time FROM parking WHERE id = ?1",
                params![id],
                Self::read_row,
            )
            .optional()?;

        row.map(Self::into_session).transpose()
    }

    fn find_by_vehicle(&self, vehicle_number: &str) -> error::Result<Option<ParkingSession>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, vehicle_no, registration_time FROM parking WHERE vehicle_no = ?1",
                params![vehicle_number],
                Self::read_row,
            )
            .optional()?;

        row.map(Self::into_session).transpose()
    }

    fn list_all(&self) -> error::Result<Vec<ParkingSession>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, vehicle_no, registration_time FROM parking ORDER BY id ASC")?;

        let rows = stmt
            .query_map([], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::into_session(row) {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!("Skipping unreadable row: {}", e),
            }
        }

        Ok(sessions)
    }

    fn count(&self) -> error::Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM parking", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn entry_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_database_open() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("parking.db");

        let store = SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(store.path(), Some(db_path.as_path()));
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();

        let session = store.insert("AB12", entry_time()).unwrap();
        assert_eq!(session.id, 1);

        let loaded = store.get(session.id).unwrap().unwrap();
        assert_eq!(loaded, session);
        assert!(store.get(99).unwrap().is_none());
    }

    #[test]
    fn test_unique_vehicle_constraint() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert("AB12", entry_time()).unwrap();

        let err = store.insert("AB12", entry_time()).unwrap_err();
        assert!(matches!(err, ParkingError::DuplicateEntry(v) if v == "AB12"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_ordered_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        // later ids may have earlier timestamps
        store.insert("ZZ99", entry_time()).unwrap();
        store
            .insert("AA11", entry_time() - Duration::hours(3))
            .unwrap();
        store.insert("MM55", entry_time()).unwrap();

        let ids: Vec<i64> = store.list_all().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let session = store.insert("AB12", entry_time()).unwrap();

        assert!(store.delete(session.id).unwrap());
        assert!(!store.delete(session.id).unwrap());
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.find_by_vehicle("AB12").unwrap().is_none());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert("AB12", entry_time()).unwrap();
        store.delete(first.id).unwrap();

        let second = store.insert("AB12", entry_time()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("parking.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.insert("AB12", entry_time()).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let found = store.find_by_vehicle("AB12").unwrap().unwrap();
        assert_eq!(found.entry_time, entry_time());
    }

    #[test]
    fn test_corrupt_timestamp_skipped_in_listing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert("AB12", entry_time()).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO parking (vehicle_no, registration_time) VALUES ('BAD1', 'yesterday')",
                [],
            )
            .unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
        assert!(matches!(
            store.find_by_vehicle("BAD1"),
            Err(ParkingError::StoreUnavailable(_))
        ));
    }
}
