//! REST routes for sessions and whiteboard areas.
//!
//! ERROR HANDLING
//! ==============
//! Every failure (unknown area, bad session, malformed body, out-of-range
//! pixel) answers `400 {"message": "Invalid values specified"}`. The specific
//! cause is logged with its error code, never returned.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::frame::ErrorCode;
use crate::interactable::Player;
use crate::services::session::{self, SessionError};
use crate::services::whiteboard::{self, NewArea, NewComment, WhiteboardError};
use crate::state::AppState;
use crate::whiteboard::{Canvas, Comment, GalleryCanvas, NewPixelData, WhiteboardAreaModel};

/// Request header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Body returned with every rejected request.
pub const INVALID_VALUES: &str = "Invalid values specified";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Whiteboard(#[from] WhiteboardError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("malformed request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Whiteboard(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Body(_) => "E_BAD_REQUEST",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(code = self.error_code(), error = %self, "api: request rejected");
        let body = serde_json::json!({ "message": INVALID_VALUES });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// The player behind the `X-Session-Token` header.
#[derive(Debug, Clone)]
pub struct SessionPlayer {
    pub player: Player,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for SessionPlayer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let app_state = AppState::from_ref(state);
        let player = session::validate_session(&app_state, token).await?;
        Ok(Self { player, token: token.to_owned() })
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    pub user_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_token: String,
    pub player_id: String,
}

/// `POST /api/sessions`: register a player.
pub async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionBody>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(body) = body?;
    let (session_token, player) = session::create_session(&state, &body.user_name).await?;
    Ok(Json(SessionResponse { session_token, player_id: player.id }))
}

// =============================================================================
// AREAS
// =============================================================================

/// `GET /api/areas`: ids of every whiteboard area.
pub async fn list_areas(State(state): State<AppState>, _session: SessionPlayer) -> Json<Vec<String>> {
    Json(whiteboard::list_areas(&state).await)
}

/// `POST /api/areas`: register an area at runtime.
pub async fn create_area(
    State(state): State<AppState>,
    _session: SessionPlayer,
    body: Result<Json<NewArea>, JsonRejection>,
) -> Result<Json<WhiteboardAreaModel>, ApiError> {
    let Json(body) = body?;
    Ok(Json(whiteboard::create_area(&state, body).await?))
}

// =============================================================================
// CANVAS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCanvasBody {
    pub name: String,
}

/// `POST /api/areas/{id}/canvas`: start a new live canvas.
pub async fn create_canvas(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
    body: Result<Json<CreateCanvasBody>, JsonRejection>,
) -> Result<Json<Canvas>, ApiError> {
    let Json(body) = body?;
    Ok(Json(whiteboard::create_canvas(&state, &area_id, &body.name).await?))
}

/// `GET /api/areas/{id}/canvas`: the live canvas or `null`.
pub async fn get_canvas(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
) -> Result<Json<Option<Canvas>>, ApiError> {
    Ok(Json(whiteboard::get_canvas(&state, &area_id).await?))
}

/// `PATCH /api/areas/{id}/canvas`: paint one pixel.
pub async fn paint_pixel(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
    body: Result<Json<NewPixelData>, JsonRejection>,
) -> Result<Json<Option<Canvas>>, ApiError> {
    let Json(body) = body?;
    Ok(Json(whiteboard::paint_pixel(&state, &area_id, body).await?))
}

/// `PATCH /api/areas/{id}/canvas/destroy`: drop the live canvas.
pub async fn destroy_canvas(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
) -> Result<Json<Option<Canvas>>, ApiError> {
    whiteboard::destroy_canvas(&state, &area_id).await?;
    Ok(Json(whiteboard::get_canvas(&state, &area_id).await?))
}

/// `GET /api/areas/{id}/gallery`: every canvas history in the area.
pub async fn get_gallery(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
) -> Result<Json<Vec<GalleryCanvas>>, ApiError> {
    Ok(Json(whiteboard::get_gallery(&state, &area_id).await?))
}

// =============================================================================
// COMMENTS
// =============================================================================

/// `POST /api/areas/{id}/comments`: submit a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    session: SessionPlayer,
    Path(area_id): Path<String>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let Json(body) = body?;
    Ok(Json(whiteboard::add_comment(&state, &area_id, &session.player.user_name, body).await?))
}

/// `DELETE /api/areas/{id}/comments`: remove every comment.
pub async fn clear_comments(
    State(state): State<AppState>,
    _session: SessionPlayer,
    Path(area_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(whiteboard::clear_comments(&state, &area_id).await?))
}

#[cfg(test)]
#[path = "areas_test.rs"]
mod tests;
