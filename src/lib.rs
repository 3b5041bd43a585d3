//! Collaborative pixel-art whiteboard server.
//!
//! Players in a shared town map paint a fixed pixel grid together, thread
//! comments under the live canvas, and replay every canvas ever drawn from
//! its gallery history.

pub mod config;
pub mod frame;
pub mod interactable;
pub mod routes;
pub mod services;
pub mod state;
pub mod whiteboard;
