//! Loading airports and events from disk, writing flights back out.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use flightlog_core::{AdsbEvent, Airport, Flight};

use crate::error::CliError;

/// Load a JSON array of airports.
pub fn load_airports(path: &Path) -> Result<Vec<Airport>, CliError> {
    let file = open(path)?;
    let airports: Vec<Airport> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::AirportJson {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), count = airports.len(), "Loaded airports");
    Ok(airports)
}

/// Load events, one JSON object per line. Blank lines are skipped.
pub fn load_events(path: &Path) -> Result<Vec<AdsbEvent>, CliError> {
    let file = open(path)?;
    let events = parse_events(BufReader::new(file), path)?;
    tracing::debug!(path = %path.display(), count = events.len(), "Loaded events");
    Ok(events)
}

fn parse_events<R: BufRead>(reader: R, path: &Path) -> Result<Vec<AdsbEvent>, CliError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|source| CliError::EventJson {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Write flights as pretty JSON. `-` means stdout.
pub fn write_flights(path: &Path, flights: &[Flight]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(flights)?;

    if path.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        return writeln!(stdout, "{json}").map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json + "\n").map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn open(path: &Path) -> Result<File, CliError> {
    if !path.exists() {
        return Err(CliError::NotFound(path.to_path_buf()));
    }
    File::open(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
