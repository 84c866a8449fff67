//! Error types for the conversational engine.

use crate::dialogue::DialoguePhase;

/// Failure of one analysis tier. Any of these makes the selector fall back
/// to the next tier within the same turn.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("malformed response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Parse(err.to_string())
    }
}

/// Errors internal to the chat engine. Never returned to the caller of
/// `process_message`; each one is rendered as a reply instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid dialogue transition: {0} -> {1}")]
    InvalidTransition(DialoguePhase, DialoguePhase),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
