//! Parking session lifecycle: entry, exit, lookups and export

use std::path::Path;

use anyhow::Context;

use crate::audit::{AuditLog, AuditOperation};
use crate::clock::{Clock, SystemClock};
use crate::config::ParkifyConfig;
use crate::error::{ParkingError, Result};
use crate::tariff::Tariff;
use crate::{export, plate, ExitReceipt, ParkingSession};

use super::database::SqliteStore;
use super::store::RecordStore;

/// Front door for every operation the presentation layer may invoke
pub struct SessionManager {
    store: Box<dyn RecordStore>,
    audit: AuditLog,
    tariff: Tariff,
    clock: Box<dyn Clock>,
}

impl SessionManager {
    /// Create a manager over an already opened store, using the wall clock
    /// and the default tariff
    pub fn new(store: impl RecordStore + 'static, audit: AuditLog) -> Self {
        Self {
            store: Box::new(store),
            audit,
            tariff: Tariff::default(),
            clock: Box::new(SystemClock),
        }
    }

    /// Open the database and audit log named by `config`
    pub fn from_config(config: &ParkifyConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.paths.database).with_context(|| {
            format!(
                "Could not open parking database {}",
                config.paths.database.display()
            )
        })?;

        Ok(Self::new(store, AuditLog::new(&config.paths.audit_log)).with_tariff(config.tariff))
    }

    pub fn with_tariff(mut self, tariff: Tariff) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn tariff(&self) -> Tariff {
        self.tariff
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Register an arriving vehicle
    pub fn register_vehicle(&self, raw_input: &str) -> Result<ParkingSession> {
        let vehicle_number = plate::normalize(raw_input)?;

        if self.store.find_by_vehicle(&vehicle_number)?.is_some() {
            return Err(ParkingError::DuplicateEntry(vehicle_number));
        }

        let session = self.store.insert(&vehicle_number, self.clock.now())?;
        tracing::info!(
            "Registered {} as session {}",
            session.vehicle_number,
            session.id
        );

        self.audit_best_effort(AuditOperation::Add, &session.vehicle_number);
        Ok(session)
    }

    /// Check a vehicle out, returning the fee owed
    pub fn remove_vehicle(&self, session_id: i64) -> Result<ExitReceipt> {
        let session = self
            .store
            .get(session_id)?
            .ok_or(ParkingError::NotFound(session_id))?;

        let exit_time = self.clock.now();
        let fee = self.tariff.fee_for(session.parked_for(exit_time));

        if !self.store.delete(session_id)? {
            return Err(ParkingError::NotFound(session_id));
        }
        tracing::info!(
            "Removed {} (session {}), fee {}",
            session.vehicle_number,
            session.id,
            fee
        );

        self.audit_best_effort(AuditOperation::Remove, &session.vehicle_number);
        Ok(ExitReceipt {
            session,
            exit_time,
            fee,
        })
    }

    /// Snapshot of every active session, by id ascending
    pub fn list_active(&self) -> Result<Vec<ParkingSession>> {
        self.store.list_all()
    }

    /// Case-insensitive exact lookup
    pub fn find_by_vehicle(&self, vehicle_number: &str) -> Result<Option<ParkingSession>> {
        let query = plate::canonicalize(vehicle_number);
        if query.is_empty() {
            return Err(ParkingError::EmptyInput);
        }
        self.store.find_by_vehicle(&query)
    }

    pub fn count_active(&self) -> Result<usize> {
        self.store.count()
    }

    /// Write all active sessions to `destination` as CSV; returns rows written
    pub fn export_all(&self, destination: impl AsRef<Path>) -> Result<usize> {
        let destination = destination.as_ref();
        let sessions = self.store.list_all()?;
        let rows = export::export_to_path(destination, &sessions)?;

        tracing::info!("Exported {} sessions to {}", rows, destination.display());
        Ok(rows)
    }

    fn audit_best_effort(&self, operation: AuditOperation, vehicle_number: &str) {
        if let Err(e) = self.audit.record(operation, vehicle_number, self.clock.now()) {
            tracing::warn!(
                "Audit log write to {} failed: {}",
                self.audit.log_path().display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_manager(temp_dir: &TempDir) -> (SessionManager, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let store = SqliteStore::open_in_memory().unwrap();
        let audit = AuditLog::new(temp_dir.path().join("parking_log.txt"));
        let manager = SessionManager::new(store, audit).with_clock(clock.clone());
        (manager, clock)
    }

    #[test]
    fn test_register_normalizes() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = create_test_manager(&temp_dir);

        let session = manager.register_vehicle("  ka01ab12 ").unwrap();
        assert_eq!(session.vehicle_number, "KA01AB12");
        assert_eq!(session.entry_time, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_duplicate_registration() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = create_test_manager(&temp_dir);

        manager.register_vehicle("AB12").unwrap();
        assert!(matches!(
            manager.register_vehicle("ab12"),
            Err(ParkingError::DuplicateEntry(v)) if v == "AB12"
        ));
        assert_eq!(manager.count_active().unwrap(), 1);
    }

    #[test]
    fn test_invalid_input_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = create_test_manager(&temp_dir);

        assert!(matches!(manager.register_vehicle(""), Err(ParkingError::EmptyInput)));
        assert!(matches!(manager.register_vehicle("   "), Err(ParkingError::EmptyInput)));
        assert!(matches!(
            manager.register_vehicle("TOOLONGPLATE123"),
            Err(ParkingError::InvalidFormat { .. })
        ));
        assert_eq!(manager.count_active().unwrap(), 0);
        assert!(manager.audit_log().entries().unwrap().is_empty());
    }

    #[test]
    fn test_remove_charges_elapsed_time() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, clock) = create_test_manager(&temp_dir);

        let session = manager.register_vehicle("AB12").unwrap();
        clock.advance(Duration::minutes(90));

        let receipt = manager.remove_vehicle(session.id).unwrap();
        assert_eq!(receipt.fee, 30);
        assert_eq!(receipt.duration(), Duration::minutes(90));
        assert_eq!(receipt.session, session);
    }

    #[test]
    fn test_remove_unknown_session() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = create_test_manager(&temp_dir);

        assert!(matches!(
            manager.remove_vehicle(42),
            Err(ParkingError::NotFound(42))
        ));
    }

    #[test]
    fn test_custom_tariff_applies() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, clock) = create_test_manager(&temp_dir);
        let manager = manager.with_tariff(Tariff::new(40, 15));

        let session = manager.register_vehicle("AB12").unwrap();
        clock.advance(Duration::minutes(10));
        assert_eq!(manager.remove_vehicle(session.id).unwrap().fee, 15);
    }

    #[test]
    fn test_find_requires_query() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, _) = create_test_manager(&temp_dir);

        assert!(matches!(manager.find_by_vehicle(" "), Err(ParkingError::EmptyInput)));
        assert!(manager.find_by_vehicle("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_audit_written_per_operation() {
        let temp_dir = TempDir::new().unwrap();
        let (manager, clock) = create_test_manager(&temp_dir);

        let session = manager.register_vehicle("AB12").unwrap();
        clock.advance(Duration::hours(2));
        manager.remove_vehicle(session.id).unwrap();

        let contents = std::fs::read_to_string(temp_dir.path().join("parking_log.txt")).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ADD - AB12 at 2024-05-01 09:00:00.000000",
                "REMOVE - AB12 at 2024-05-01 11:00:00.000000",
            ]
        );
    }

    #[test]
    fn test_audit_failure_does_not_fail_operation() {
        let temp_dir = TempDir::new().unwrap();
        // the log path is a directory, so every append fails
        let audit = AuditLog::new(temp_dir.path());
        let manager = SessionManager::new(SqliteStore::open_in_memory().unwrap(), audit);

        let session = manager.register_vehicle("AB12").unwrap();
        assert!(manager.remove_vehicle(session.id).is_ok());
    }

    #[test]
    fn test_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ParkifyConfig::default();
        config.paths.database = temp_dir.path().join("db").join("parking.db");
        config.paths.audit_log = temp_dir.path().join("parking_log.txt");
        config.tariff = Tariff::new(30, 12);

        let manager = SessionManager::from_config(&config).unwrap();
        assert_eq!(manager.tariff(), Tariff::new(30, 12));
        manager.register_vehicle("AB12").unwrap();
        assert!(config.paths.database.exists());
        assert!(config.paths.audit_log.exists());
    }
}
