//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into axum handlers via the `State` extractor. It is
//! the registry of whiteboard areas and player sessions for the process. Each
//! area is mutated only under the registry's write lock, which serializes
//! edits per process.
//!
//! Lock order is always `areas` before `sessions` when both are held.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{self, Config, MapFileError};
use crate::interactable::Player;
use crate::whiteboard::WhiteboardArea;

/// Shared application state. Clone is required by axum; all inner fields are
/// `Arc`-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// Whiteboard areas keyed by area id.
    pub areas: Arc<RwLock<HashMap<String, WhiteboardArea>>>,
    /// Players keyed by session token.
    pub sessions: Arc<RwLock<HashMap<String, Player>>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            areas: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    /// Build state and register every whiteboard declared in the map file.
    /// Malformed or duplicate map objects are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `MapFileError` if the configured map file cannot be read.
    pub fn from_config(config: Config) -> Result<Self, MapFileError> {
        let objects = match &config.whiteboard_map {
            Some(path) => config::load_map_objects(path)?,
            None => Vec::new(),
        };

        let mut areas = HashMap::new();
        for object in &objects {
            match WhiteboardArea::from_map_object(object, config.area_event_capacity) {
                Ok(area) if areas.contains_key(area.id()) => {
                    warn!(area_id = %area.id(), "duplicate whiteboard area skipped");
                }
                Ok(area) => {
                    areas.insert(area.id().to_owned(), area);
                }
                Err(e) => warn!(error = %e, "whiteboard area skipped"),
            }
        }
        info!(count = areas.len(), "whiteboard areas loaded");

        let state = Self::new(config);
        Ok(Self { areas: Arc::new(RwLock::new(areas)), ..state })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::interactable::BoundingBox;

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(Config::default())
    }

    /// Register an empty area and return its id.
    pub async fn seed_area(state: &AppState, id: &str) -> String {
        let bbox = BoundingBox { x: 0.0, y: 0.0, width: 100.0, height: 100.0 };
        let area = WhiteboardArea::with_event_capacity(id, bbox, state.config.area_event_capacity);
        state.areas.write().await.insert(id.to_owned(), area);
        id.to_owned()
    }

    /// Register a player session and return its token.
    pub async fn seed_session(state: &AppState, user_name: &str) -> (String, Player) {
        let token = crate::services::session::generate_token();
        let player = Player::new(uuid::Uuid::new_v4().to_string(), user_name);
        state.sessions.write().await.insert(token.clone(), player.clone());
        (token, player)
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
