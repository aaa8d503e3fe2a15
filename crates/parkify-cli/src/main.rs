use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use parkify_core::{ParkifyConfig, ParkingSession, SessionManager, DISPLAY_TIME_FORMAT};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parkify", version, about = "Parkify - Parking Management")]
struct Cli {
	/// Config file to load after ~/.parkify/config.toml
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	/// Log debug output to stderr
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Register an arriving vehicle
	Register {
		/// License plate (letters and digits, at most 10)
		plate: String,
	},
	/// Check a vehicle out by session id and show the fee
	Remove {
		/// Session id as shown by `list`
		id: i64,
	},
	/// List vehicles currently parked
	List {
		/// Print JSON instead of one line per vehicle
		#[arg(long)]
		json: bool,
	},
	/// Look up a vehicle by license plate
	Search {
		plate: String,
	},
	/// Show how many vehicles are parked
	Count,
	/// Export active sessions to CSV
	Export {
		/// Destination file (defaults to the configured export path)
		#[arg(long)]
		out: Option<PathBuf>,
	},
	/// Show logged arrivals and departures
	History {
		/// Only entries for this plate
		plate: Option<String>,
	},
	/// Print the effective configuration
	Config,
}

fn init_tracing(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

/// Decorate status lines only when a person is watching
fn mark(symbol: &'static str) -> &'static str {
	if atty::is(atty::Stream::Stdout) {
		symbol
	} else {
		""
	}
}

/// A miss is an error so the process exits non-zero after normal cleanup
fn search(manager: &SessionManager, plate: &str) -> Result<ParkingSession> {
	match manager.find_by_vehicle(plate)? {
		Some(session) => Ok(session),
		None => bail!("Vehicle not found: {}", plate.trim()),
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	let config = ParkifyConfig::load_from(cli.config.as_deref())?;

	if let Commands::Config = cli.command {
		print!("{}", config.to_toml()?);
		return Ok(());
	}

	let manager = SessionManager::from_config(&config)?;

	match cli.command {
		Commands::Register { plate } => {
			let session = manager.register_vehicle(&plate)?;
			println!("{}Registered {}", mark("✅ "), session.vehicle_number);
			println!("{}Session ID: {}", mark("🎫 "), session.id);
			println!(
				"{}Entry Time: {}",
				mark("🕒 "),
				session.entry_time.format(DISPLAY_TIME_FORMAT)
			);
		}
		Commands::Remove { id } => {
			let receipt = manager.remove_vehicle(id)?;
			let minutes = receipt.duration().num_minutes();
			println!(
				"{}Vehicle {} removed",
				mark("🚗 "),
				receipt.session.vehicle_number
			);
			println!("{}Parked: {}h {:02}m", mark("⏱️  "), minutes / 60, minutes % 60);
			println!("{}Total parking fee: {}", mark("💰 "), receipt.fee);
		}
		Commands::List { json } => {
			let sessions = manager.list_active()?;
			if json {
				println!("{}", serde_json::to_string_pretty(&sessions)?);
			} else if sessions.is_empty() {
				println!("No vehicles parked");
			} else {
				for session in &sessions {
					println!("{}", session);
				}
			}
		}
		Commands::Search { plate } => {
			let session = search(&manager, &plate)?;
			println!(
				"{}Vehicle Found: {} - {}",
				mark("✅ "),
				session.vehicle_number,
				session.entry_time.format(DISPLAY_TIME_FORMAT)
			);
			println!("{}Session ID: {}", mark("🎫 "), session.id);
		}
		Commands::Count => {
			println!("Total vehicles parked: {}", manager.count_active()?);
		}
		Commands::Export { out } => {
			let destination = out.unwrap_or_else(|| config.paths.export.clone());
			let rows = manager.export_all(&destination)?;
			println!(
				"{}Exported {} vehicle(s) to {}",
				mark("📁 "),
				rows,
				destination.display()
			);
		}
		Commands::History { plate } => {
			let audit = manager.audit_log();
			let entries = match plate {
				Some(plate) => audit.history_for(&parkify_core::plate::canonicalize(&plate))?,
				None => audit.entries()?,
			};
			if entries.is_empty() {
				println!("No logged operations");
			}
			for entry in entries {
				println!("{}", entry.to_line());
			}
		}
		Commands::Config => unreachable!(),
	}
	Ok(())
}
