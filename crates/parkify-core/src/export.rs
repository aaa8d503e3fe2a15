//! CSV export of active sessions

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::{ParkingSession, DISPLAY_TIME_FORMAT};

pub const CSV_HEADER: &str = "ID,Vehicle No,Registration Time";

/// Write the header and one row per session. Returns the number of data rows.
pub fn write_csv<W: Write>(mut out: W, sessions: &[ParkingSession]) -> io::Result<usize> {
    writeln!(out, "{}", CSV_HEADER)?;

    for session in sessions {
        writeln!(
            out,
            "{},{},{}",
            session.id,
            escape_field(&session.vehicle_number),
            session.entry_time.format(DISPLAY_TIME_FORMAT)
        )?;
    }

    out.flush()?;
    Ok(sessions.len())
}

/// Create (or truncate) `path` and write the sessions to it
pub fn export_to_path(path: impl AsRef<Path>, sessions: &[ParkingSession]) -> io::Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    write_csv(BufWriter::new(file), sessions)
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
