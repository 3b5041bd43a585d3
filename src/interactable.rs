//! Spatial areas on the town map and the players standing in them.
//!
//! SYSTEM CONTEXT
//! ==============
//! Whiteboards are one kind of interactable area. This module owns only what
//! the whiteboard needs from that concept: a bounding rectangle and the list
//! of players currently inside it.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub user_name: String,
    /// Area the player currently occupies.
    pub interactable_id: Option<String>,
}

impl Player {
    pub fn new(id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self { id: id.into(), user_name: user_name.into(), interactable_id: None }
    }
}

/// Occupancy tracking for one area.
#[derive(Debug, Clone)]
pub struct InteractableArea {
    id: String,
    bounding_box: BoundingBox,
    occupants: Vec<String>,
}

impl InteractableArea {
    pub fn new(id: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self { id: id.into(), bounding_box, occupants: Vec::new() }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Player ids in join order.
    #[must_use]
    pub fn occupants_by_id(&self) -> &[String] {
        &self.occupants
    }

    /// Record the player as an occupant and point their location at this area.
    /// Returns `false` if they were already inside.
    pub fn add(&mut self, player: &mut Player) -> bool {
        player.interactable_id = Some(self.id.clone());
        if self.occupants.iter().any(|id| id == &player.id) {
            return false;
        }
        self.occupants.push(player.id.clone());
        true
    }

    /// Remove the player and clear their location. Returns `false` if they
    /// were not inside.
    pub fn remove(&mut self, player: &mut Player) -> bool {
        if player.interactable_id.as_deref() == Some(self.id.as_str()) {
            player.interactable_id = None;
        }
        let before = self.occupants.len();
        self.occupants.retain(|id| id != &player.id);
        self.occupants.len() != before
    }
}
