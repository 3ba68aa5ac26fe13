//! CLI errors and exit handling.

use std::path::PathBuf;
use std::process;

use flightlog_core::FlightError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid airport data in {path}: {source}")]
    AirportJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid event on line {line} of {path}: {source}")]
    EventJson {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to serialize flights: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Flight(#[from] FlightError),
}

impl CliError {
    /// Log the error and exit non-zero.
    pub fn exit(&self) -> ! {
        tracing::error!("{self}");
        if let CliError::Flight(FlightError::EmptyAirportIndex) = self {
            eprintln!("Check that the airports file is a JSON array with latitude/longitude values.");
        }
        process::exit(1)
    }
}
