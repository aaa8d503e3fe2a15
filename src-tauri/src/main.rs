// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tauri::State;

use parkify_core::{ParkifyConfig, ParkingSession, SessionManager, DISPLAY_TIME_FORMAT};

/// Row shown in the occupancy list; the id travels with the plate so the
/// frontend never has to parse display text
#[derive(Debug, Serialize, Deserialize)]
struct VehicleRow {
    id: i64,
    vehicle_number: String,
    entry_time: DateTime<Utc>,
    label: String,
}

impl From<ParkingSession> for VehicleRow {
    fn from(session: ParkingSession) -> Self {
        Self {
            label: format!(
                "{} - {}",
                session.vehicle_number,
                session.entry_time.format(DISPLAY_TIME_FORMAT)
            ),
            id: session.id,
            vehicle_number: session.vehicle_number,
            entry_time: session.entry_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RemovalResult {
    vehicle_number: String,
    minutes_parked: i64,
    fee: u64,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportResult {
    path: String,
    rows: usize,
    message: String,
}

// Application state
struct AppState {
    manager: Mutex<SessionManager>,
    export_path: PathBuf,
}

impl AppState {
    fn with_manager<T>(
        &self,
        op: impl FnOnce(&SessionManager) -> Result<T, parkify_core::ParkingError>,
    ) -> Result<T, String> {
        let manager = self
            .manager
            .lock()
            .map_err(|_| "Parking database is unavailable".to_string())?;
        op(&*manager).map_err(|e| e.to_string())
    }
}

#[tauri::command]
fn register_vehicle(plate: String, state: State<'_, AppState>) -> Result<VehicleRow, String> {
    state
        .with_manager(|m| m.register_vehicle(&plate))
        .map(VehicleRow::from)
}

#[tauri::command]
fn remove_vehicle(id: i64, state: State<'_, AppState>) -> Result<RemovalResult, String> {
    let receipt = state.with_manager(|m| m.remove_vehicle(id))?;

    Ok(RemovalResult {
        message: format!("Vehicle removed. Total parking fee: {}", receipt.fee),
        vehicle_number: receipt.session.vehicle_number.clone(),
        minutes_parked: receipt.duration().num_minutes(),
        fee: receipt.fee,
    })
}

#[tauri::command]
fn list_vehicles(state: State<'_, AppState>) -> Result<Vec<VehicleRow>, String> {
    let sessions = state.with_manager(|m| m.list_active())?;
    Ok(sessions.into_iter().map(VehicleRow::from).collect())
}

#[tauri::command]
fn search_vehicle(plate: String, state: State<'_, AppState>) -> Result<VehicleRow, String> {
    state
        .with_manager(|m| m.find_by_vehicle(&plate))?
        .map(VehicleRow::from)
        .ok_or_else(|| "Vehicle not found!".to_string())
}

#[tauri::command]
fn total_vehicles(state: State<'_, AppState>) -> Result<usize, String> {
    state.with_manager(|m| m.count_active())
}

#[tauri::command]
fn export_csv(path: Option<String>, state: State<'_, AppState>) -> Result<ExportResult, String> {
    let destination = path
        .map(PathBuf::from)
        .unwrap_or_else(|| state.export_path.clone());
    let rows = state.with_manager(|m| m.export_all(&destination))?;

    Ok(ExportResult {
        path: destination.display().to_string(),
        rows,
        message: format!("Parking data exported to {}", destination.display()),
    })
}

#[tauri::command]
fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn build_state(config: ParkifyConfig) -> anyhow::Result<AppState> {
    let manager = SessionManager::from_config(&config)?;

    Ok(AppState {
        manager: Mutex::new(manager),
        export_path: config.paths.export,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = match ParkifyConfig::load()
        .map_err(anyhow::Error::from)
        .and_then(build_state)
    {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Startup failed: {:#}", e);
            eprintln!("Parkify could not start: {:#}", e);
            std::process::exit(1);
        }
    };

    tauri::Builder::default()
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            register_vehicle,
            remove_vehicle,
            list_vehicles,
            search_vehicle,
            total_vehicles,
            export_csv,
            get_app_version
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
