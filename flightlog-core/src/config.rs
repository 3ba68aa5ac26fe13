//! Classifier thresholds and configuration file management.
//!
//! Reads/writes `~/.flightlog/config.yaml` with input/output paths and the
//! airborne classifier thresholds.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;

use crate::types::FlightError;

/// Thresholds driving the per-aircraft airborne classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Below this many feet above the nearest airport's elevation counts as low.
    pub altitude_threshold_ft: f64,
    /// Below this speed counts as slow (unit as supplied by the source data).
    pub speed_threshold: f64,
    /// Average distance to the nearest airport at or under this is "near", in miles.
    pub airport_distance_mi: f64,
    /// No new transition within this long of the previous one.
    pub min_transition_delay: TimeDelta,
    /// Width of the distance-to-airport moving average.
    pub average_window: TimeDelta,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            altitude_threshold_ft: 500.0,
            speed_threshold: 150.0,
            airport_distance_mi: 3.0,
            min_transition_delay: TimeDelta::minutes(10),
            average_window: TimeDelta::minutes(5),
        }
    }
}

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: PathsConfig,
    pub thresholds: TrackerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub airports: String,
    pub events: String,
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig {
                airports: "data/airports.json".into(),
                events: "data/events.txt".into(),
                output: "data/flights.json".into(),
            },
            thresholds: TrackerConfig::default(),
        }
    }
}

/// Get the config directory path (`~/.flightlog/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".flightlog")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable config file, using defaults");
            Config::default()
        }
    }
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<PathBuf, FlightError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(path.to_path_buf())
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep defaults.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match current_section.as_deref() {
            Some("paths") => {
                if let Some(v) = parse_string_value(val) {
                    match key {
                        "airports" => config.paths.airports = v,
                        "events" => config.paths.events = v,
                        "output" => config.paths.output = v,
                        _ => {}
                    }
                }
            }
            Some("thresholds") => {
                let thresholds = &mut config.thresholds;
                match key {
                    "altitude_ft" => set_float(&mut thresholds.altitude_threshold_ft, val),
                    "speed" => set_float(&mut thresholds.speed_threshold, val),
                    "airport_distance_mi" => set_float(&mut thresholds.airport_distance_mi, val),
                    "transition_delay_secs" => set_seconds(&mut thresholds.min_transition_delay, val),
                    "average_window_secs" => set_seconds(&mut thresholds.average_window, val),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn set_float(slot: &mut f64, val: &str) {
    if let Some(v) = val.parse::<f64>().ok().filter(|v| v.is_finite()) {
        *slot = v;
    }
}

/// Longest accepted window or delay: one week.
const MAX_DURATION_SECS: i64 = 7 * 24 * 3600;

fn set_seconds(slot: &mut TimeDelta, val: &str) {
    if let Some(v) = val
        .parse::<i64>()
        .ok()
        .filter(|secs| (1..=MAX_DURATION_SECS).contains(secs))
        .and_then(TimeDelta::try_seconds)
    {
        *slot = v;
    }
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let t = &config.thresholds;
    let lines = [
        "# flightlog configuration".to_string(),
        String::new(),
        "paths:".into(),
        format!("  airports: \"{}\"", config.paths.airports),
        format!("  events: \"{}\"", config.paths.events),
        format!("  output: \"{}\"", config.paths.output),
        String::new(),
        "thresholds:".into(),
        format!("  altitude_ft: {}", t.altitude_threshold_ft),
        format!("  speed: {}", t.speed_threshold),
        format!("  airport_distance_mi: {}", t.airport_distance_mi),
        format!("  transition_delay_secs: {}", t.min_transition_delay.num_seconds()),
        format!("  average_window_secs: {}", t.average_window.num_seconds()),
    ];
    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
