//! Player sessions.
//!
//! A session binds an opaque random token to one `Player`. Every REST call
//! and websocket upgrade presents the token; nothing reaches the whiteboard
//! core without a valid one.

use std::fmt::Write;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::interactable::Player;
use crate::state::AppState;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("user name required")]
    EmptyUserName,
    #[error("session token required")]
    MissingToken,
    #[error("invalid session token")]
    InvalidToken,
}

impl crate::frame::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyUserName => "E_USER_NAME_REQUIRED",
            Self::MissingToken => "E_SESSION_REQUIRED",
            Self::InvalidToken => "E_SESSION_INVALID",
        }
    }
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Register a new player and return their session token.
///
/// # Errors
///
/// Returns `SessionError::EmptyUserName` if the trimmed name is empty.
pub async fn create_session(state: &AppState, user_name: &str) -> Result<(String, Player), SessionError> {
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(SessionError::EmptyUserName);
    }
    let token = generate_token();
    let player = Player::new(Uuid::new_v4().to_string(), user_name);
    state.sessions.write().await.insert(token.clone(), player.clone());
    info!(player_id = %player.id, user_name, "session created");
    Ok((token, player))
}

/// Resolve a session token to its player.
///
/// # Errors
///
/// Returns `MissingToken` for an empty token and `InvalidToken` when no
/// session matches.
pub async fn validate_session(state: &AppState, token: &str) -> Result<Player, SessionError> {
    if token.is_empty() {
        return Err(SessionError::MissingToken);
    }
    state.sessions.read().await.get(token).cloned().ok_or(SessionError::InvalidToken)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
