//! Environment-driven server configuration.
//!
//! `.env` is loaded first when present. Numeric settings that fail to parse
//! fall back to their defaults.

use std::path::{Path, PathBuf};

use crate::whiteboard::MapObject;
use crate::whiteboard::area::{DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WS_CLIENT_BUFFER: usize = 256;
pub const MAX_WS_CLIENT_BUFFER: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// JSON file listing the whiteboard objects of the town map.
    pub whiteboard_map: Option<PathBuf>,
    /// Buffered area-changed models per area.
    pub area_event_capacity: usize,
    /// Outbound frames buffered per websocket connection.
    pub ws_client_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            whiteboard_map: None,
            area_event_capacity: DEFAULT_EVENT_CAPACITY,
            ws_client_buffer: DEFAULT_WS_CLIENT_BUFFER,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// - `PORT`: default 3000
    /// - `WHITEBOARD_MAP`: optional path to the map object file
    /// - `AREA_EVENT_CAPACITY`: default 64, clamped to `1..=4096`
    /// - `WS_CLIENT_BUFFER`: default 256, clamped to `1..=65536`
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            whiteboard_map: std::env::var("WHITEBOARD_MAP").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            area_event_capacity: env_parse("AREA_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY).clamp(1, MAX_EVENT_CAPACITY),
            ws_client_buffer: env_parse("WS_CLIENT_BUFFER", DEFAULT_WS_CLIENT_BUFFER).clamp(1, MAX_WS_CLIENT_BUFFER),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// MAP FILE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MapFileError {
    #[error("read map file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parse map file {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Parse the whiteboard objects from a JSON array.
///
/// # Errors
///
/// Returns `MapFileError` if the file is unreadable or not a JSON array of
/// map objects.
pub fn load_map_objects(path: &Path) -> Result<Vec<MapObject>, MapFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| MapFileError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| MapFileError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
