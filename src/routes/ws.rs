//! WebSocket handler: frame dispatch plus area-change relay.
//!
//! DESIGN
//! ======
//! On upgrade the session token is validated and the connection enters a
//! `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Outbound frames queued by the area relay → forward to client
//!
//! Handlers validate, call the whiteboard service, and return an `Outcome`.
//! They never publish. The area itself publishes a fresh model after every
//! change, and a relay task per joined area turns each model into an
//! `area:changed` frame for this client.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id` and `player_id`
//! 2. `area:join` → occupant added, model returned, relay started
//! 3. Canvas/comment frames → service call → reply
//! 4. Close → relay stopped, occupant removed

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MAX_WS_CLIENT_BUFFER;
use crate::frame::{Data, FRAME_MODEL, Frame, Status};
use crate::interactable::Player;
use crate::routes::areas::ApiError;
use crate::services::{self, whiteboard::NewComment};
use crate::state::AppState;
use crate::whiteboard::{NewPixelData, WhiteboardAreaModel};

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. Handlers never send frames directly.
enum Outcome {
    /// Send done+data to sender only.
    Reply(Data),
    /// Send empty done to sender only.
    Done,
}

/// Per-connection state threaded through dispatch.
struct Connection {
    client_id: Uuid,
    token: String,
    player: Player,
    client_tx: mpsc::Sender<Frame>,
    current_area: Option<String>,
    relay: Option<JoinHandle<()>>,
}

impl Connection {
    fn new(token: String, player: Player, client_tx: mpsc::Sender<Frame>) -> Self {
        Self { client_id: Uuid::new_v4(), token, player, client_tx, current_area: None, relay: None }
    }

    fn stop_relay(&mut self) {
        if let Some(relay) = self.relay.take() {
            relay.abort();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stop_relay();
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = params.get("session").cloned().unwrap_or_default();
    let player = match services::session::validate_session(&state, &token).await {
        Ok(player) => player,
        Err(e) => return ApiError::from(e).into_response(),
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, token, player))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, token: String, player: Player) {
    let buffer = state.config.ws_client_buffer.clamp(1, MAX_WS_CLIENT_BUFFER);
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(buffer);
    let mut conn = Connection::new(token, player, client_tx);

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("client_id", conn.client_id.to_string())
        .with_data("player_id", conn.player.id.clone())
        .with_data("user_name", conn.player.user_name.clone());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(client_id = %conn.client_id, player_id = %conn.player.id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, &mut conn, &text).await {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    conn.stop_relay();
    services::whiteboard::leave_current_area(&state, &conn.token).await;
    info!(client_id = %conn.client_id, player_id = %conn.player.id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
async fn process_inbound_text(state: &AppState, conn: &mut Connection, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(client_id = %conn.client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    info!(
        client_id = %conn.client_id,
        player_id = %conn.player.id,
        id = %req.id,
        syscall = %req.syscall,
        "ws: recv frame"
    );

    let result = match req.prefix() {
        "area" => handle_area(state, conn, &req).await,
        "canvas" => handle_canvas(state, conn.current_area.as_deref(), &req).await,
        "comment" => handle_comment(state, conn, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Err(err_frame) => vec![err_frame],
    }
}

/// Decode the frame's data map into a typed payload.
fn parse_data<T: DeserializeOwned>(req: &Frame) -> Result<T, Frame> {
    let value = serde_json::Value::Object(req.data.clone().into_iter().collect());
    serde_json::from_value(value).map_err(|e| req.error(format!("invalid payload: {e}")))
}

fn reply_with(key: &str, value: impl serde::Serialize) -> Outcome {
    let mut data = Data::new();
    data.insert(key.into(), serde_json::to_value(value).unwrap_or_default());
    Outcome::Reply(data)
}

fn joined_area<'a>(current_area: Option<&'a str>, req: &Frame) -> Result<&'a str, Frame> {
    current_area.ok_or_else(|| req.error("must join an area first"))
}

// =============================================================================
// AREA HANDLERS
// =============================================================================

async fn handle_area(state: &AppState, conn: &mut Connection, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let Some(area_id) = req.area_id.as_deref().or_else(|| req.str_field("area_id")) else {
                return Err(req.error("area_id required"));
            };
            let (model, rx) = services::whiteboard::join_area(state, area_id, &conn.token)
                .await
                .map_err(|e| req.error_from(&e))?;

            conn.stop_relay();
            conn.relay = Some(spawn_relay(area_id.to_owned(), rx, conn.client_tx.clone()));
            conn.current_area = Some(area_id.to_owned());
            Ok(reply_with(FRAME_MODEL, &model))
        }
        "part" => {
            let Some(area_id) = conn.current_area.take() else {
                return Ok(Outcome::Done);
            };
            conn.stop_relay();
            services::whiteboard::part_area(state, &area_id, &conn.token)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        "get" => {
            let area_id = joined_area(conn.current_area.as_deref(), req)?;
            let model = services::whiteboard::get_model(state, area_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with(FRAME_MODEL, &model))
        }
        "list" => Ok(reply_with("areas", services::whiteboard::list_areas(state).await)),
        op => Err(req.error(format!("unknown area op: {op}"))),
    }
}

/// Forward every published model as an `area:changed` frame until the area
/// channel closes or the client queue goes away.
fn spawn_relay(
    area_id: String,
    mut rx: broadcast::Receiver<WhiteboardAreaModel>,
    client_tx: mpsc::Sender<Frame>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let model = match rx.recv().await {
                Ok(model) => model,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%area_id, skipped, "ws: relay lagged, skipping to newest model");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let frame = Frame::request("area:changed", Data::new())
                .with_area_id(area_id.clone())
                .with_data(FRAME_MODEL, serde_json::to_value(&model).unwrap_or_default());
            if client_tx.send(frame).await.is_err() {
                break;
            }
        }
    })
}

// =============================================================================
// CANVAS HANDLERS
// =============================================================================

#[derive(serde::Deserialize)]
struct CanvasName {
    name: String,
}

async fn handle_canvas(state: &AppState, current_area: Option<&str>, req: &Frame) -> Result<Outcome, Frame> {
    let area_id = joined_area(current_area, req)?;

    match req.op() {
        "create" => {
            let CanvasName { name } = parse_data(req)?;
            let canvas = services::whiteboard::create_canvas(state, area_id, &name)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with("canvas", canvas))
        }
        "get" => {
            let canvas = services::whiteboard::get_canvas(state, area_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with("canvas", canvas))
        }
        "paint" => {
            let data: NewPixelData = parse_data(req)?;
            services::whiteboard::paint_pixel(state, area_id, data)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        "destroy" => {
            services::whiteboard::destroy_canvas(state, area_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        "gallery" => {
            let gallery = services::whiteboard::get_gallery(state, area_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with("gallery", gallery))
        }
        op => Err(req.error(format!("unknown canvas op: {op}"))),
    }
}

// =============================================================================
// COMMENT HANDLERS
// =============================================================================

async fn handle_comment(state: &AppState, conn: &Connection, req: &Frame) -> Result<Outcome, Frame> {
    let area_id = joined_area(conn.current_area.as_deref(), req)?;

    match req.op() {
        "add" => {
            let comment: NewComment = parse_data(req)?;
            let comments = services::whiteboard::add_comment(state, area_id, &conn.player.user_name, comment)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with("comments", comments))
        }
        "clear" => {
            let comments = services::whiteboard::clear_comments(state, area_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(reply_with("comments", comments))
        }
        op => Err(req.error(format!("unknown comment op: {op}"))),
    }
}

// =============================================================================
// SEND
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.str_field("code").unwrap_or("-");
        let message = frame.str_field("message").unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
