//! flightlog: reconstruct flights from an ADS-B event log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use flightlog_core::config::{self, Config};
use flightlog_core::{AirportIndex, Flight, GeoCoordinate, Tracker};

mod error;
mod io;
mod logging;

use error::CliError;

#[derive(Parser)]
#[command(name = "flightlog", version, about = "Reconstruct flights from ADS-B telemetry")]
struct Cli {
    /// Config file (defaults to ~/.flightlog/config.yaml)
    #[arg(long, global = true, env = "FLIGHTLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an event log and write the reconstructed flights
    Track {
        /// Airports JSON file
        #[arg(long, env = "FLIGHTLOG_AIRPORTS")]
        airports: Option<PathBuf>,

        /// Event log, one JSON object per line
        #[arg(long, env = "FLIGHTLOG_EVENTS")]
        events: Option<PathBuf>,

        /// Output JSON file, or "-" for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Order flights by aircraft, then departure time
        #[arg(long)]
        sorted: bool,

        /// Print a summary table instead of writing JSON
        #[arg(long)]
        table: bool,
    },

    /// Find the airport nearest to a position
    Nearest {
        /// Airports JSON file
        #[arg(long, env = "FLIGHTLOG_AIRPORTS")]
        airports: Option<PathBuf>,

        /// Latitude in decimal degrees
        #[arg(allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// Show the effective configuration, or write a default config file
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::config_file);
    let cfg = config::load_config_from(&config_path);

    let result = match cli.command {
        Commands::Track {
            airports,
            events,
            output,
            sorted,
            table,
        } => {
            let airports = airports.unwrap_or_else(|| PathBuf::from(&cfg.paths.airports));
            let events = events.unwrap_or_else(|| PathBuf::from(&cfg.paths.events));
            let output = output.unwrap_or_else(|| PathBuf::from(&cfg.paths.output));
            cmd_track(&cfg, &airports, &events, &output, sorted, table)
        }
        Commands::Nearest { airports, lat, lon } => {
            let airports = airports.unwrap_or_else(|| PathBuf::from(&cfg.paths.airports));
            cmd_nearest(&airports, lat, lon)
        }
        Commands::Config { init } => cmd_config(&cfg, &config_path, init),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn cmd_track(
    cfg: &Config,
    airports_path: &Path,
    events_path: &Path,
    output: &Path,
    sorted: bool,
    table: bool,
) -> Result<(), CliError> {
    let airports = AirportIndex::new(io::load_airports(airports_path)?)?;
    let events = io::load_events(events_path)?;

    let mut tracker = Tracker::new(Arc::new(airports), cfg.thresholds.clone());
    tracker.process_all(&events)?;

    let flights = if sorted {
        tracker.flights_sorted()
    } else {
        tracker.flights()
    };

    let completed = flights.iter().filter(|f| f.is_complete()).count();
    tracing::info!(
        flights = flights.len(),
        completed,
        in_progress = flights.len() - completed,
        aircraft = tracker.aircraft_count(),
        "Reconstructed flights"
    );

    if table {
        print_summary(&flights, tracker.total_events, tracker.aircraft_count());
        return Ok(());
    }

    io::write_flights(output, &flights)?;
    if output.as_os_str() != "-" {
        tracing::info!(path = %output.display(), "Wrote flights");
    }
    Ok(())
}

fn cmd_nearest(airports_path: &Path, lat: f64, lon: f64) -> Result<(), CliError> {
    let index = AirportIndex::new(io::load_airports(airports_path)?)?;
    let position = GeoCoordinate::new(lat, lon);
    if !position.has_location() {
        tracing::warn!("Position has no location, result is arbitrary");
    }

    let (airport, distance) = index.nearest_with_distance(&position);
    let bearing = position.bearing_to(&airport.coordinate());
    println!(
        "{}  {:.4}, {:.4}  elev {:.0} ft  {:.1} mi  bearing {:.0}°",
        airport.identifier, airport.latitude, airport.longitude, airport.elevation, distance, bearing
    );
    Ok(())
}

fn cmd_config(cfg: &Config, path: &Path, init: bool) -> Result<(), CliError> {
    if init {
        let written = config::save_config_to(&Config::default(), path)?;
        println!("Wrote default configuration to {}", written.display());
        return Ok(());
    }

    let t = &cfg.thresholds;
    println!("Config file: {}", path.display());
    println!();
    println!("  airports:            {}", cfg.paths.airports);
    println!("  events:              {}", cfg.paths.events);
    println!("  output:              {}", cfg.paths.output);
    println!("  altitude threshold:  {} ft", t.altitude_threshold_ft);
    println!("  speed threshold:     {}", t.speed_threshold);
    println!("  airport distance:    {} mi", t.airport_distance_mi);
    println!("  transition delay:    {} s", t.min_transition_delay.num_seconds());
    println!("  average window:      {} s", t.average_window.num_seconds());
    Ok(())
}

fn print_summary(flights: &[Flight], total_events: u64, aircraft: usize) {
    println!();
    println!(
        "Events: {total_events} processed, {aircraft} aircraft, {} flights",
        flights.len()
    );
    println!();

    if flights.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Aircraft", "From", "Departed", "To", "Arrived", "Duration"]);

    for flight in flights {
        let duration = match (flight.departure_time, flight.arrival_time) {
            (Some(dep), Some(arr)) => {
                let mins = (arr - dep).num_minutes();
                format!("{}h{:02}m", mins / 60, mins % 60)
            }
            _ => "-".into(),
        };
        table.add_row(vec![
            Cell::new(&flight.aircraft_identifier),
            Cell::new(flight.departure_airport.as_deref().unwrap_or("-")),
            Cell::new(format_time(flight.departure_time)),
            Cell::new(flight.arrival_airport.as_deref().unwrap_or("-")),
            Cell::new(format_time(flight.arrival_time)),
            Cell::new(duration),
        ]);
    }

    println!("{table}");
}

fn format_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or("-".into())
}
