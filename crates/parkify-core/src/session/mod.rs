//! Parking session management
//!
//! The record store holds one row per vehicle currently parked; the
//! session manager validates input, prices exits and keeps the audit log.

pub mod database;
pub mod manager;
pub mod store;

// Re-export main types
pub use database::SqliteStore;
pub use manager::SessionManager;
pub use store::RecordStore;
