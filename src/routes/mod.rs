//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST endpoints for sessions and whiteboard areas plus the
//! websocket upgrade under a single axum router. REST handlers answer the
//! caller; area changes reach every joined client over the websocket.

pub mod areas;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/sessions", post(areas::create_session))
        .route("/api/areas", get(areas::list_areas).post(areas::create_area))
        .route(
            "/api/areas/{id}/canvas",
            get(areas::get_canvas)
                .post(areas::create_canvas)
                .patch(areas::paint_pixel),
        )
        .route("/api/areas/{id}/canvas/destroy", patch(areas::destroy_canvas))
        .route("/api/areas/{id}/gallery", get(areas::get_gallery))
        .route(
            "/api/areas/{id}/comments",
            post(areas::add_comment).delete(areas::clear_comments),
        )
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
