//! Whiteboard service: the dispatch layer in front of the core.
//!
//! DESIGN
//! ======
//! Each operation resolves the target area from `AppState`, validates what
//! the core treats as a precondition (pixel index, canvas name), invokes
//! exactly one core operation under the registry write lock, and returns
//! the resulting state. Core no-ops (painting or commenting with no live
//! canvas, orphan replies) are not errors here either; callers receive the
//! current state.
//!
//! Publishing happens inside the core, so a subscriber never observes a
//! half-applied mutation.

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::frame::ErrorCode;
use crate::interactable::Player;
use crate::services::session::SessionError;
use crate::state::AppState;
use crate::whiteboard::{
    AreaError, Canvas, Comment, GalleryCanvas, MapObject, NewPixelData, PIXEL_COUNT, WhiteboardArea,
    WhiteboardAreaModel,
};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WhiteboardError {
    #[error("whiteboard area not found: {0}")]
    AreaNotFound(String),
    #[error("whiteboard area already exists: {0}")]
    AreaExists(String),
    #[error(transparent)]
    InvalidArea(#[from] AreaError),
    #[error("canvas name required")]
    EmptyCanvasName,
    #[error("pixel index {0} out of range")]
    InvalidPixelIndex(usize),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ErrorCode for WhiteboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AreaNotFound(_) => "E_AREA_NOT_FOUND",
            Self::AreaExists(_) => "E_AREA_EXISTS",
            Self::InvalidArea(_) => "E_AREA_INVALID",
            Self::EmptyCanvasName => "E_CANVAS_NAME_REQUIRED",
            Self::InvalidPixelIndex(_) => "E_PIXEL_INDEX",
            Self::Session(e) => e.error_code(),
        }
    }
}

/// Request body for registering an area at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArea {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// A submitted comment. Server fills `id`, `dateCreated`, and `author`
/// when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub text: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
}

impl NewComment {
    /// Materialize into a `Comment`, falling back to `author` for a missing
    /// author name.
    #[must_use]
    pub fn into_comment(self, author: &str) -> Comment {
        let mut comment = Comment::new(self.author.unwrap_or_else(|| author.to_owned()), self.text, self.parent_comment_id);
        if let Some(id) = self.id.filter(|id| !id.is_empty()) {
            comment.id = id;
        }
        if let Some(date) = self.date_created.filter(|d| !d.is_empty()) {
            comment.date_created = date;
        }
        comment.replies = self.replies;
        comment
    }
}

// =============================================================================
// AREA ACCESS
// =============================================================================

async fn with_area<T>(state: &AppState, area_id: &str, f: impl FnOnce(&WhiteboardArea) -> T) -> Result<T, WhiteboardError> {
    let areas = state.areas.read().await;
    let area = areas.get(area_id).ok_or_else(|| WhiteboardError::AreaNotFound(area_id.to_owned()))?;
    Ok(f(area))
}

async fn with_area_mut<T>(
    state: &AppState,
    area_id: &str,
    f: impl FnOnce(&mut WhiteboardArea) -> T,
) -> Result<T, WhiteboardError> {
    let mut areas = state.areas.write().await;
    let area = areas.get_mut(area_id).ok_or_else(|| WhiteboardError::AreaNotFound(area_id.to_owned()))?;
    Ok(f(area))
}

/// Ids of every registered area, sorted.
pub async fn list_areas(state: &AppState) -> Vec<String> {
    let mut ids: Vec<String> = state.areas.read().await.keys().cloned().collect();
    ids.sort();
    ids
}

/// Register an area at runtime.
///
/// # Errors
///
/// Returns `AreaExists` for a taken id and `InvalidArea` for missing or
/// non-positive dimensions.
pub async fn create_area(state: &AppState, new_area: NewArea) -> Result<WhiteboardAreaModel, WhiteboardError> {
    let object = MapObject {
        name: new_area.id,
        x: new_area.x,
        y: new_area.y,
        width: new_area.width,
        height: new_area.height,
    };
    let mut areas = state.areas.write().await;
    if areas.contains_key(&object.name) {
        return Err(WhiteboardError::AreaExists(object.name));
    }
    let area = WhiteboardArea::from_map_object(&object, state.config.area_event_capacity)?;
    let model = area.to_model();
    info!(area_id = %model.id, "whiteboard area registered");
    areas.insert(model.id.clone(), area);
    Ok(model)
}

/// Current wire model of an area.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn get_model(state: &AppState, area_id: &str) -> Result<WhiteboardAreaModel, WhiteboardError> {
    with_area(state, area_id, WhiteboardArea::to_model).await
}

// =============================================================================
// CANVAS
// =============================================================================

/// Start a new live canvas.
///
/// # Errors
///
/// Returns `EmptyCanvasName` for a blank name and `AreaNotFound` for an
/// unknown area.
pub async fn create_canvas(state: &AppState, area_id: &str, name: &str) -> Result<Canvas, WhiteboardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WhiteboardError::EmptyCanvasName);
    }
    with_area_mut(state, area_id, |area| area.create_canvas(name)).await
}

/// The live canvas, if any.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn get_canvas(state: &AppState, area_id: &str) -> Result<Option<Canvas>, WhiteboardError> {
    with_area(state, area_id, |area| area.canvas().cloned()).await
}

/// Paint one pixel and return the live canvas afterwards.
///
/// # Errors
///
/// Returns `InvalidPixelIndex` when the index is outside the grid and
/// `AreaNotFound` for an unknown area.
pub async fn paint_pixel(state: &AppState, area_id: &str, data: NewPixelData) -> Result<Option<Canvas>, WhiteboardError> {
    if data.pix_ind >= PIXEL_COUNT {
        return Err(WhiteboardError::InvalidPixelIndex(data.pix_ind));
    }
    with_area_mut(state, area_id, |area| {
        area.paint_pixel(data);
        area.canvas().cloned()
    })
    .await
}

/// Drop the live canvas.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn destroy_canvas(state: &AppState, area_id: &str) -> Result<(), WhiteboardError> {
    with_area_mut(state, area_id, WhiteboardArea::destroy_canvas).await
}

/// Every gallery entry of the area.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn get_gallery(state: &AppState, area_id: &str) -> Result<Vec<GalleryCanvas>, WhiteboardError> {
    with_area(state, area_id, |area| area.gallery().to_vec()).await
}

// =============================================================================
// COMMENTS
// =============================================================================

/// Submit a comment and return the resulting comment list.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn add_comment(
    state: &AppState,
    area_id: &str,
    author: &str,
    comment: NewComment,
) -> Result<Vec<Comment>, WhiteboardError> {
    let comment = comment.into_comment(author);
    with_area_mut(state, area_id, |area| {
        area.add_comment(comment);
        area.comments().to_vec()
    })
    .await
}

/// Remove every comment and return the (empty) list.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area.
pub async fn clear_comments(state: &AppState, area_id: &str) -> Result<Vec<Comment>, WhiteboardError> {
    with_area_mut(state, area_id, |area| {
        area.clear_comments();
        area.comments().to_vec()
    })
    .await
}

// =============================================================================
// OCCUPANCY
// =============================================================================

/// Move the session's player into an area. Leaves any previous area first.
/// Returns the area model and a receiver for subsequent changes.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area and `Session` for an unknown
/// token.
pub async fn join_area(
    state: &AppState,
    area_id: &str,
    token: &str,
) -> Result<(WhiteboardAreaModel, broadcast::Receiver<WhiteboardAreaModel>), WhiteboardError> {
    let mut areas = state.areas.write().await;
    if !areas.contains_key(area_id) {
        return Err(WhiteboardError::AreaNotFound(area_id.to_owned()));
    }
    let mut sessions = state.sessions.write().await;
    let player = sessions.get_mut(token).ok_or(SessionError::InvalidToken)?;

    if let Some(previous) = player.interactable_id.clone().filter(|id| id != area_id) {
        if let Some(old) = areas.get_mut(&previous) {
            old.remove(player);
        }
    }
    let area = areas
        .get_mut(area_id)
        .ok_or_else(|| WhiteboardError::AreaNotFound(area_id.to_owned()))?;
    area.add(player);
    Ok((area.to_model(), area.subscribe()))
}

/// Remove the session's player from an area.
///
/// # Errors
///
/// Returns `AreaNotFound` for an unknown area and `Session` for an unknown
/// token.
pub async fn part_area(state: &AppState, area_id: &str, token: &str) -> Result<(), WhiteboardError> {
    let mut areas = state.areas.write().await;
    let area = areas.get_mut(area_id).ok_or_else(|| WhiteboardError::AreaNotFound(area_id.to_owned()))?;
    let mut sessions = state.sessions.write().await;
    let player = sessions.get_mut(token).ok_or(SessionError::InvalidToken)?;
    area.remove(player);
    Ok(())
}

/// Remove the session's player from whatever area they occupy. Used on
/// disconnect.
pub async fn leave_current_area(state: &AppState, token: &str) -> Option<Player> {
    let mut areas = state.areas.write().await;
    let mut sessions = state.sessions.write().await;
    let player = sessions.get_mut(token)?;
    if let Some(area_id) = player.interactable_id.clone() {
        if let Some(area) = areas.get_mut(&area_id) {
            area.remove(player);
        }
    }
    Some(player.clone())
}

#[cfg(test)]
#[path = "whiteboard_test.rs"]
mod tests;
