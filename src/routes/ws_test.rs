use super::*;
use crate::state::test_helpers;
use crate::whiteboard::PIXEL_COUNT;
use serde_json::json;
use tokio::time::{Duration, timeout};

async fn connect(state: &AppState, user_name: &str) -> (Connection, mpsc::Receiver<Frame>) {
    let (token, player) = test_helpers::seed_session(state, user_name).await;
    let (tx, rx) = mpsc::channel(32);
    (Connection::new(token, player, tx), rx)
}

fn request_text(syscall: &str, data: serde_json::Value) -> String {
    let data: Data = serde_json::from_value(data).unwrap();
    serde_json::to_string(&Frame::request(syscall, data)).unwrap()
}

async fn send(state: &AppState, conn: &mut Connection, syscall: &str, data: serde_json::Value) -> Frame {
    let mut frames = process_inbound_text(state, conn, &request_text(syscall, data)).await;
    assert_eq!(frames.len(), 1);
    frames.remove(0)
}

async fn recv_changed(rx: &mut mpsc::Receiver<Frame>) -> WhiteboardAreaModel {
    let frame = timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("area:changed receive timed out")
        .expect("channel closed");
    assert_eq!(frame.syscall, "area:changed");
    serde_json::from_value(frame.data[FRAME_MODEL].clone()).unwrap()
}

async fn assert_no_frame(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

#[tokio::test]
async fn invalid_json_returns_gateway_error() {
    let state = test_helpers::test_app_state();
    let (mut conn, _rx) = connect(&state, "alice").await;
    let frames = process_inbound_text(&state, &mut conn, "{not json").await;
    assert_eq!(frames[0].syscall, "gateway:error");
}

#[tokio::test]
async fn unknown_prefix_and_op_return_errors() {
    let state = test_helpers::test_app_state();
    let (mut conn, _rx) = connect(&state, "alice").await;

    let reply = send(&state, &mut conn, "board:join", json!({})).await;
    assert_eq!(reply.status, Status::Error);

    let reply = send(&state, &mut conn, "area:dance", json!({})).await;
    assert_eq!(reply.status, Status::Error);
}

#[tokio::test]
async fn canvas_ops_require_joined_area() {
    let state = test_helpers::test_app_state();
    let (mut conn, _rx) = connect(&state, "alice").await;

    let reply = send(&state, &mut conn, "canvas:create", json!({"name": "Test"})).await;
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.str_field("message"), Some("must join an area first"));
}

#[tokio::test]
async fn join_requires_area_id_and_known_area() {
    let state = test_helpers::test_app_state();
    let (mut conn, _rx) = connect(&state, "alice").await;

    let reply = send(&state, &mut conn, "area:join", json!({})).await;
    assert_eq!(reply.str_field("message"), Some("area_id required"));

    let reply = send(&state, &mut conn, "area:join", json!({"area_id": "ghost"})).await;
    assert_eq!(reply.str_field("code"), Some("E_AREA_NOT_FOUND"));
    assert!(conn.current_area.is_none());
}

#[tokio::test]
async fn join_replies_with_model_and_tracks_occupant() {
    let state = test_helpers::test_app_state();
    let area_id = test_helpers::seed_area(&state, "whiteboard-1").await;
    let (mut conn, mut rx) = connect(&state, "alice").await;

    let reply = send(&state, &mut conn, "area:join", json!({"area_id": area_id})).await;
    assert_eq!(reply.status, Status::Done);
    assert_eq!(reply.data[FRAME_MODEL], json!({"id": "whiteboard-1", "comments": [], "gallery": []}));
    assert_eq!(conn.current_area.as_deref(), Some("whiteboard-1"));
    assert_eq!(state.areas.read().await[&area_id].occupants_by_id(), &[conn.player.id.clone()]);
    assert_no_frame(&mut rx).await;
}

#[tokio::test]
async fn mutations_reach_every_joined_client() {
    let state = test_helpers::test_app_state();
    let area_id = test_helpers::seed_area(&state, "whiteboard-1").await;
    let (mut alice, mut alice_rx) = connect(&state, "alice").await;
    let (mut bob, mut bob_rx) = connect(&state, "bob").await;

    send(&state, &mut alice, "area:join", json!({"area_id": area_id})).await;
    send(&state, &mut bob, "area:join", json!({"area_id": area_id})).await;
    // Bob joining is itself an area change.
    assert_eq!(recv_changed(&mut alice_rx).await.id, "whiteboard-1");

    let reply = send(&state, &mut alice, "canvas:create", json!({"name": "Test"})).await;
    assert_eq!(reply.data["canvas"]["name"], "Test");
    for rx in [&mut alice_rx, &mut bob_rx] {
        let model = recv_changed(rx).await;
        assert_eq!(model.canvas.map(|c| c.name), Some("Test".to_owned()));
    }

    let paint = json!({"pixInd": 0, "color": {"r": 0, "g": 0, "b": 0, "a": 1.0}});
    let reply = send(&state, &mut bob, "canvas:paint", paint).await;
    assert_eq!(reply.status, Status::Done);
    let model = recv_changed(&mut alice_rx).await;
    assert_eq!(model.canvas.unwrap().pixels[0].color.r, 0);
    assert_eq!(model.gallery[0].len(), 2);
    recv_changed(&mut bob_rx).await;

    let reply = send(&state, &mut bob, "comment:add", json!({"text": "nice"})).await;
    assert_eq!(reply.data["comments"][0]["author"], "bob");
    assert_eq!(recv_changed(&mut alice_rx).await.comments.len(), 1);
}

#[tokio::test]
async fn paint_rejects_out_of_range_index() {
    let state = test_helpers::test_app_state();
    let area_id = test_helpers::seed_area(&state, "whiteboard-1").await;
    let (mut conn, mut rx) = connect(&state, "alice").await;
    send(&state, &mut conn, "area:join", json!({"area_id": area_id})).await;
    send(&state, &mut conn, "canvas:create", json!({"name": "Test"})).await;
    recv_changed(&mut rx).await;

    let paint = json!({"pixInd": PIXEL_COUNT, "color": {"r": 0, "g": 0, "b": 0, "a": 1.0}});
    let reply = send(&state, &mut conn, "canvas:paint", paint).await;
    assert_eq!(reply.str_field("code"), Some("E_PIXEL_INDEX"));

    let reply = send(&state, &mut conn, "canvas:paint", json!({"pixInd": 0})).await;
    assert_eq!(reply.status, Status::Error);
    assert_no_frame(&mut rx).await;
}

#[tokio::test]
async fn part_stops_relay_and_removes_occupant() {
    let state = test_helpers::test_app_state();
    let area_id = test_helpers::seed_area(&state, "whiteboard-1").await;
    let (mut conn, mut rx) = connect(&state, "alice").await;
    send(&state, &mut conn, "area:join", json!({"area_id": area_id})).await;

    let reply = send(&state, &mut conn, "area:part", json!({})).await;
    assert_eq!(reply.status, Status::Done);
    assert!(conn.current_area.is_none());
    assert!(state.areas.read().await[&area_id].occupants_by_id().is_empty());

    services::whiteboard::create_canvas(&state, &area_id, "Later").await.unwrap();
    assert_no_frame(&mut rx).await;
}

#[tokio::test]
async fn gallery_and_destroy_over_frames() {
    let state = test_helpers::test_app_state();
    let area_id = test_helpers::seed_area(&state, "whiteboard-1").await;
    let (mut conn, _rx) = connect(&state, "alice").await;
    send(&state, &mut conn, "area:join", json!({"area_id": area_id})).await;
    send(&state, &mut conn, "canvas:create", json!({"name": "Test"})).await;

    let reply = send(&state, &mut conn, "canvas:destroy", json!({})).await;
    assert_eq!(reply.status, Status::Done);

    let reply = send(&state, &mut conn, "canvas:get", json!({})).await;
    assert_eq!(reply.data["canvas"], serde_json::Value::Null);

    let reply = send(&state, &mut conn, "canvas:gallery", json!({})).await;
    assert_eq!(reply.data["gallery"][0]["name"], "Test");

    let reply = send(&state, &mut conn, "comment:clear", json!({})).await;
    assert_eq!(reply.data["comments"], json!([]));
}
