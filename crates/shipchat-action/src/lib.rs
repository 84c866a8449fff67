//! Action engine for shipchat.
//!
//! Turns a resolved intent plus the conversation's slot memory into one
//! authenticated call against the logistics backend, and renders the
//! outcome as a reply fragment.

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod state_machine;
pub mod summary;

pub use backend::{Envelope, HttpLogisticsBackend, LogisticsBackend, NewShipment};
pub use dispatcher::{ActionDispatcher, DispatchResult};
pub use error::ActionError;
pub use handler::{ActionHandler, ActionRegistry, ActionRequest};
