//! Error types for action dispatch and the logistics backend.

use shipchat_core::{ActionStatus, ActionType};

/// Errors from action handlers and the backend they call.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Remote service returned status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
    #[error("Action type not registered: {0}")]
    UnregisteredHandler(ActionType),
    #[error("Invalid action transition: {0} -> {1}")]
    InvalidTransition(ActionStatus, ActionStatus),
}

impl ActionError {
    /// The message the server attached to a non-success response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ActionError::Remote { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
