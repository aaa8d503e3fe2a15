//! Record store interface

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ParkingSession;

/// Request/response access to the table of active sessions.
///
/// Each call is one atomic statement against the backing store. Vehicle
/// numbers passed in are already normalized.
pub trait RecordStore: Send {
    /// Insert a session and return it with its assigned id.
    ///
    /// Fails with `DuplicateEntry` if the vehicle already has a row.
    fn insert(&self, vehicle_number: &str, entry_time: DateTime<Utc>) -> Result<ParkingSession>;

    /// Delete by id; `false` if no row matched.
    fn delete(&self, id: i64) -> Result<bool>;

    fn get(&self, id: i64) -> Result<Option<ParkingSession>>;

    fn find_by_vehicle(&self, vehicle_number: &str) -> Result<Option<ParkingSession>>;

    /// All sessions, ordered by id ascending.
    fn list_all(&self) -> Result<Vec<ParkingSession>>;

    fn count(&self) -> Result<usize>;
}
