//! Authoritative state for one whiteboard area.
//!
//! DESIGN
//! ======
//! A `WhiteboardArea` owns the live canvas, the comment thread, the gallery
//! of every canvas ever created here, and the occupancy list. All mutation
//! goes through `&mut self`, so the owner (the shared area registry) provides
//! the single-writer guarantee with its lock.
//!
//! LIFECYCLE
//! =========
//! `current_canvas` toggles between `None` and `Some` via `create_canvas` and
//! `destroy_canvas`. Comments are cleared only by `clear_comments`. The
//! gallery only grows. Occupants leaving never clears area data.
//!
//! Every mutation that changes state publishes a fresh
//! `WhiteboardAreaModel` on a broadcast channel. Receivers always see a
//! fully applied mutation because the model is built after the change and
//! before the lock is released.
//!
//! ERROR HANDLING
//! ==============
//! Operations against an absent canvas and replies to unknown parents are
//! silent no-ops. A pixel index outside the grid is a caller bug and panics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::canvas::{Canvas, PIXEL_COUNT};
use super::color::PixelColor;
use super::comments::{Comment, CommentThread};
use super::gallery::GalleryCanvas;
use crate::interactable::{BoundingBox, InteractableArea, Player};

/// Default buffered models per area before slow subscribers start lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Upper bound on buffered models per area. Larger requests are clamped.
pub const MAX_EVENT_CAPACITY: usize = 4096;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A single pixel edit request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPixelData {
    pub pix_ind: usize,
    pub color: PixelColor,
}

/// Serializable snapshot of an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardAreaModel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<Canvas>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub gallery: Vec<GalleryCanvas>,
}

/// Whiteboard object from the town map definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapObject {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AreaError {
    #[error("malformed whiteboard area {0}: missing or invalid dimensions")]
    MissingDimensions(String),
}

// =============================================================================
// AREA
// =============================================================================

#[derive(Debug)]
pub struct WhiteboardArea {
    area: InteractableArea,
    current_canvas: Option<Canvas>,
    comments: CommentThread,
    gallery: Vec<GalleryCanvas>,
    events: broadcast::Sender<WhiteboardAreaModel>,
}

impl WhiteboardArea {
    /// Create an empty area with no live canvas.
    pub fn new(id: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self::with_event_capacity(id, bounding_box, DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty area whose change channel buffers `capacity` models,
    /// clamped to `1..=MAX_EVENT_CAPACITY`.
    pub fn with_event_capacity(id: impl Into<String>, bounding_box: BoundingBox, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            area: InteractableArea::new(id, bounding_box),
            current_canvas: None,
            comments: CommentThread::new(),
            gallery: Vec::new(),
            events,
        }
    }

    /// Build an area from a map object.
    ///
    /// # Errors
    ///
    /// Returns `AreaError::MissingDimensions` when width or height is absent
    /// or not positive.
    pub fn from_map_object(object: &MapObject, capacity: usize) -> Result<Self, AreaError> {
        let (Some(width), Some(height)) = (object.width, object.height) else {
            return Err(AreaError::MissingDimensions(object.name.clone()));
        };
        if width <= 0.0 || height <= 0.0 {
            return Err(AreaError::MissingDimensions(object.name.clone()));
        }
        let bbox = BoundingBox { x: object.x, y: object.y, width, height };
        Ok(Self::with_event_capacity(object.name.clone(), bbox, capacity))
    }

    /// Restore an area from a previously produced model. A canvas without any
    /// gallery gets a fresh gallery entry so later edits have somewhere to go.
    pub fn from_model(model: WhiteboardAreaModel, bounding_box: BoundingBox) -> Self {
        let mut area = Self::new(model.id, bounding_box);
        area.gallery = model.gallery;
        if let Some(canvas) = &model.canvas {
            if area.gallery.is_empty() {
                area.gallery.push(GalleryCanvas::new(canvas.name.clone()));
            }
        }
        area.current_canvas = model.canvas;
        area.comments = model.comments.into();
        area
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn id(&self) -> &str {
        self.area.id()
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.area.bounding_box()
    }

    #[must_use]
    pub fn canvas(&self) -> Option<&Canvas> {
        self.current_canvas.as_ref()
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        self.comments.as_slice()
    }

    #[must_use]
    pub fn gallery(&self) -> &[GalleryCanvas] {
        &self.gallery
    }

    #[must_use]
    pub fn occupants_by_id(&self) -> &[String] {
        self.area.occupants_by_id()
    }

    /// Receive a model after every published change.
    pub fn subscribe(&self) -> broadcast::Receiver<WhiteboardAreaModel> {
        self.events.subscribe()
    }

    // -------------------------------------------------------------------------
    // Canvas lifecycle
    // -------------------------------------------------------------------------

    /// Replace the live canvas with a fresh white one and open its gallery
    /// entry. The previous canvas is dropped without recording its final state.
    pub fn create_canvas(&mut self, name: impl Into<String>) -> Canvas {
        let canvas = Canvas::new(name);
        self.gallery.push(GalleryCanvas::new(canvas.name.clone()));
        let replaced = self.current_canvas.replace(canvas.clone());
        info!(
            area_id = %self.id(),
            name = %canvas.name,
            replaced = replaced.is_some(),
            galleries = self.gallery.len(),
            "canvas created"
        );
        self.emit_area_changed();
        canvas
    }

    /// Drop the live canvas. Comments and gallery are kept.
    pub fn destroy_canvas(&mut self) {
        if let Some(canvas) = self.current_canvas.take() {
            info!(area_id = %self.id(), name = %canvas.name, "canvas destroyed");
        }
        self.emit_area_changed();
    }

    /// Record the pre-edit grid into the newest gallery entry, then recolour
    /// one pixel.
    ///
    /// # Panics
    ///
    /// Panics if a canvas is live and `data.pix_ind >= PIXEL_COUNT`.
    pub fn paint_pixel(&mut self, data: NewPixelData) {
        let Some(canvas) = self.current_canvas.as_mut() else {
            debug!(area_id = %self.area.id(), "paint ignored: no live canvas");
            return;
        };
        assert!(data.pix_ind < PIXEL_COUNT, "pixel index {} out of range", data.pix_ind);

        let snapshot = canvas.snapshot();
        if self.gallery.is_empty() {
            self.gallery.push(GalleryCanvas::new(canvas.name.clone()));
        }
        if let Some(entry) = self.gallery.last_mut() {
            entry.record(snapshot);
        }
        canvas.paint(data.pix_ind, data.color);
        debug!(area_id = %self.area.id(), pix_ind = data.pix_ind, "pixel painted");
        self.emit_area_changed();
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    /// Attach a comment to the live canvas's thread.
    pub fn add_comment(&mut self, comment: Comment) {
        if self.current_canvas.is_none() {
            debug!(area_id = %self.id(), "comment ignored: no live canvas");
            return;
        }
        let comment_id = comment.id.clone();
        if !self.comments.add(comment) {
            debug!(area_id = %self.id(), %comment_id, "comment ignored: parent not found");
            return;
        }
        self.emit_area_changed();
    }

    pub fn clear_comments(&mut self) {
        let removed = self.comments.total();
        self.comments.clear();
        info!(area_id = %self.id(), removed, "comments cleared");
        self.emit_area_changed();
    }

    // -------------------------------------------------------------------------
    // Wire model
    // -------------------------------------------------------------------------

    /// Detached snapshot of the area's state.
    #[must_use]
    pub fn to_model(&self) -> WhiteboardAreaModel {
        WhiteboardAreaModel {
            id: self.id().to_owned(),
            canvas: self.current_canvas.clone(),
            comments: self.comments.as_slice().to_vec(),
            gallery: self.gallery.clone(),
        }
    }

    /// Replace canvas and comments from a remote model. Gallery is untouched
    /// and nothing is published.
    pub fn update_model(&mut self, model: WhiteboardAreaModel) {
        self.current_canvas = model.canvas;
        self.comments = model.comments.into();
    }

    // -------------------------------------------------------------------------
    // Occupancy
    // -------------------------------------------------------------------------

    pub fn add(&mut self, player: &mut Player) {
        if self.area.add(player) {
            info!(area_id = %self.id(), player_id = %player.id, "player entered area");
        }
        self.emit_area_changed();
    }

    pub fn remove(&mut self, player: &mut Player) {
        if self.area.remove(player) {
            info!(area_id = %self.id(), player_id = %player.id, "player left area");
        }
        self.emit_area_changed();
    }

    fn emit_area_changed(&self) {
        if self.events.receiver_count() == 0 {
            return;
        }
        let _ = self.events.send(self.to_model());
    }
}

#[cfg(test)]
#[path = "area_test.rs"]
mod tests;
