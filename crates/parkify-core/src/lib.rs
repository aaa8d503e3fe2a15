use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod plate;
pub mod session;
pub mod tariff;

pub use audit::{AuditEntry, AuditLog, AuditOperation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ParkifyConfig};
pub use error::ParkingError;
pub use session::{RecordStore, SessionManager, SqliteStore};
pub use tariff::Tariff;

/// Timestamp layout used when sessions are shown or exported.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A vehicle currently occupying the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSession {
    /// Assigned by the record store, never reused while active
    pub id: i64,
    /// Normalized plate (uppercase, alphanumeric, at most 10 characters)
    pub vehicle_number: String,
    pub entry_time: DateTime<Utc>,
}

impl ParkingSession {
    /// Time parked as of `now`.
    pub fn parked_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.entry_time
    }
}

impl std::fmt::Display for ParkingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} - {}",
            self.id,
            self.vehicle_number,
            self.entry_time.format(DISPLAY_TIME_FORMAT)
        )
    }
}

/// Outcome of a vehicle leaving the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReceipt {
    pub session: ParkingSession,
    pub exit_time: DateTime<Utc>,
    /// Whole currency units owed
    pub fee: u64,
}

impl ExitReceipt {
    pub fn duration(&self) -> Duration {
        self.session.parked_for(self.exit_time)
    }
}
