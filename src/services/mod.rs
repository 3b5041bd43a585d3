//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules resolve areas and sessions from `AppState`, validate
//! input, and invoke the whiteboard core, so route handlers stay focused on
//! protocol translation.

pub mod session;
pub mod whiteboard;
