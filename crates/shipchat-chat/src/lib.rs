//! Conversational engine for shipchat.
//!
//! Routes each message through a fallback chain of analysis tiers
//! (realtime channel, remote HTTP, local classifier), fills the active
//! intent's slots across turns and dispatches the resulting action.

pub mod dialogue;
pub mod engine;
pub mod error;
pub mod selector;
pub mod transport;

pub use dialogue::{ConversationState, DialogueManager, DialoguePhase, TurnPlan};
pub use engine::ChatEngine;
pub use error::{ChatError, TransportError};
pub use selector::{TierBoard, TierHealth};
pub use transport::{
    Analysis, AnalysisRequest, Analyzer, DialogueSnapshot, LocalAnalyzer, RealtimeAnalyzer,
    RemoteHttpAnalyzer, TcpConnector, Tier,
};
