//! Live websocket sessions against a server bound to an ephemeral port.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pixelboard::config::Config;
use pixelboard::frame::{Data, Frame, Status};
use pixelboard::routes;
use pixelboard::services::{session, whiteboard};
use pixelboard::state::AppState;
use pixelboard::whiteboard::{WhiteboardAreaController, WhiteboardAreaModel};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (AppState, SocketAddr) {
    let state = AppState::new(Config::default());
    whiteboard::create_area(
        &state,
        whiteboard::NewArea { id: "whiteboard-1".into(), x: 0.0, y: 0.0, width: Some(100.0), height: Some(100.0) },
    )
    .await
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr)
}

async fn connect(state: &AppState, addr: SocketAddr, user_name: &str) -> (Client, String) {
    let (token, player) = session::create_session(state, user_name).await.unwrap();
    let (mut ws, _) = connect_async(format!("ws://{addr}/api/ws?session={token}")).await.unwrap();
    let welcome = recv(&mut ws).await;
    assert_eq!(welcome.syscall, "session:connected");
    assert_eq!(welcome.data["player_id"], json!(player.id));
    (ws, player.id)
}

async fn recv(ws: &mut Client) -> Frame {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("frame receive timed out")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one with the given syscall and status arrives.
async fn recv_until(ws: &mut Client, syscall: &str, status: Status) -> Frame {
    loop {
        let frame = recv(ws).await;
        if frame.syscall == syscall && frame.status == status {
            return frame;
        }
    }
}

async fn request(ws: &mut Client, syscall: &str, data: serde_json::Value) {
    let data: Data = serde_json::from_value(data).unwrap();
    let text = serde_json::to_string(&Frame::request(syscall, data)).unwrap();
    ws.send(Message::Text(text.into())).await.unwrap();
}

fn model_of(frame: &Frame) -> WhiteboardAreaModel {
    serde_json::from_value(frame.data["model"].clone()).unwrap()
}

#[tokio::test]
async fn upgrade_rejects_unknown_session() {
    let (_, addr) = spawn_server().await;
    assert!(connect_async(format!("ws://{addr}/api/ws?session=bogus")).await.is_err());
}

#[tokio::test]
async fn painting_is_mirrored_to_other_client() {
    let (state, addr) = spawn_server().await;
    let (mut alice, _) = connect(&state, addr, "alice").await;
    let (mut bob, _) = connect(&state, addr, "bob").await;

    request(&mut alice, "area:join", json!({"area_id": "whiteboard-1"})).await;
    let joined = recv_until(&mut alice, "area:join", Status::Done).await;
    assert_eq!(model_of(&joined).id, "whiteboard-1");

    request(&mut bob, "area:join", json!({"area_id": "whiteboard-1"})).await;
    let joined = recv_until(&mut bob, "area:join", Status::Done).await;
    let mut mirror = WhiteboardAreaController::new(model_of(&joined));
    let mut canvas_rx = mirror.subscribe_canvas();

    request(&mut alice, "canvas:create", json!({"name": "Test"})).await;
    let created = recv_until(&mut bob, "area:changed", Status::Request).await;
    mirror.update_from(model_of(&created));
    assert!(canvas_rx.has_changed().unwrap());
    assert_eq!(canvas_rx.borrow_and_update().as_ref().map(|c| c.name.clone()), Some("Test".to_owned()));

    request(&mut alice, "canvas:paint", json!({"pixInd": 0, "color": {"r": 0, "g": 0, "b": 0, "a": 1.0}})).await;
    let painted = recv_until(&mut bob, "area:changed", Status::Request).await;
    let model = model_of(&painted);
    let canvas = model.canvas.clone().unwrap();
    assert_eq!(canvas.pixels[0].color.r, 0);
    assert_eq!(canvas.pixels[1].color.r, 255);
    assert_eq!(model.gallery[0].history.len(), 2);

    mirror.update_from(model);
    assert_eq!(mirror.canvas(), Some(canvas));
    assert_eq!(mirror.gallery()[0].history.len(), 2);
}

#[tokio::test]
async fn disconnect_removes_occupant_but_keeps_canvas() {
    let (state, addr) = spawn_server().await;
    let (mut alice, player_id) = connect(&state, addr, "alice").await;

    request(&mut alice, "area:join", json!({"area_id": "whiteboard-1"})).await;
    recv_until(&mut alice, "area:join", Status::Done).await;
    request(&mut alice, "canvas:create", json!({"name": "Keep"})).await;
    recv_until(&mut alice, "canvas:create", Status::Done).await;
    assert_eq!(state.areas.read().await["whiteboard-1"].occupants_by_id(), &[player_id]);

    alice.close(None).await.unwrap();

    let emptied = timeout(Duration::from_secs(2), async {
        loop {
            if state.areas.read().await["whiteboard-1"].occupants_by_id().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(emptied.is_ok(), "occupant was not removed after disconnect");

    let canvas = whiteboard::get_canvas(&state, "whiteboard-1").await.unwrap();
    assert_eq!(canvas.map(|c| c.name), Some("Keep".to_owned()));
}
