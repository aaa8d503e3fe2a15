//! Append-only operation log
//!
//! Every registration and exit is recorded as one human-readable line:
//! `ADD - KA01AB1234 at 2024-05-01 09:30:00.000000`. The file is the only
//! place where history survives once a session leaves the record store.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const AUDIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Kinds of auditable operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    /// Vehicle registered
    Add,
    /// Vehicle exited
    Remove,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Add => "ADD",
            AuditOperation::Remove => "REMOVE",
        }
    }
}

impl std::fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single audit log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub operation: AuditOperation,
    pub vehicle_number: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Render as a log line, without the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{} - {} at {}",
            self.operation,
            self.vehicle_number,
            self.timestamp.format(AUDIT_TIME_FORMAT)
        )
    }

    /// Parse a line written by [`AuditEntry::to_line`]
    pub fn parse_line(line: &str) -> Option<Self> {
        let (operation, rest) = line.split_once(" - ")?;
        let (vehicle_number, timestamp) = rest.split_once(" at ")?;

        let operation = match operation {
            "ADD" => AuditOperation::Add,
            "REMOVE" => AuditOperation::Remove,
            _ => return None,
        };

        let timestamp = NaiveDateTime::parse_from_str(timestamp.trim(), AUDIT_TIME_FORMAT)
            .ok()?
            .and_utc();

        Some(Self {
            operation,
            vehicle_number: vehicle_number.to_string(),
            timestamp,
        })
    }
}

/// Audit log file handle
///
/// Only the path is held; the file is opened in append mode, written and
/// closed again for each entry.
#[derive(Debug, Clone)]
pub struct AuditLog {
    log_path: PathBuf,
}

impl AuditLog {
    /// Create an audit log at `log_path`; nothing is touched until the first write
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Append one entry
    pub fn record(
        &self,
        operation: AuditOperation,
        vehicle_number: &str,
        timestamp: DateTime<Utc>,
    ) -> io::Result<()> {
        let entry = AuditEntry {
            operation,
            vehicle_number: vehicle_number.to_string(),
            timestamp,
        };

        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", entry.to_line())?;
        file.flush()
    }

    /// Read back every entry, skipping lines that do not parse.
    ///
    /// A missing file means nothing has been logged yet.
    pub fn entries(&self) -> io::Result<Vec<AuditEntry>> {
        let contents = match std::fs::read_to_string(&self.log_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(contents
            .lines()
            .filter_map(|line| {
                let entry = AuditEntry::parse_line(line);
                if entry.is_none() && !line.trim().is_empty() {
                    tracing::warn!("Skipping malformed audit line: {}", line);
                }
                entry
            })
            .collect())
    }

    /// Entries for one vehicle, oldest first
    pub fn history_for(&self, vehicle_number: &str) -> io::Result<Vec<AuditEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.vehicle_number == vehicle_number)
            .collect())
    }

    /// Get log file path
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
