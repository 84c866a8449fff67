//! Interchangeable analysis tiers.
//!
//! Each tier turns one user message (plus recent history and the dialogue
//! snapshot) into an [`Analysis`]. The realtime and HTTP tiers delegate to a
//! remote service; the local tier runs the deterministic classifier.

pub mod local;
pub mod realtime;
pub mod remote_http;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shipchat_core::{ContextMemory, Credential, EntityBag, EntityValue, Field, Intent, Message, Role};

use crate::error::TransportError;

pub use local::LocalAnalyzer;
pub use realtime::{RealtimeAnalyzer, TcpConnector};
pub use remote_http::RemoteHttpAnalyzer;

/// Position in the fallback chain. Declaration order is priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Realtime,
    RemoteHttp,
    Local,
}

impl Tier {
    pub const PRIORITY: [Tier; 3] = [Tier::Realtime, Tier::RemoteHttp, Tier::Local];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Realtime => write!(f, "realtime"),
            Tier::RemoteHttp => write!(f, "remote_http"),
            Tier::Local => write!(f, "local"),
        }
    }
}

/// One prior turn as sent to remote tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Dialogue state shared with the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSnapshot {
    pub active_intent: Option<Intent>,
    pub memory: ContextMemory,
}

/// Input of every tier. Serializes to the wire body
/// `{message, history, token, userName, context}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub token: Credential,
    pub user_name: Option<String>,
    pub context: DialogueSnapshot,
}

/// Normalized output of every tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: EntityBag,
    pub response: String,
}

/// Uniform interface over the three tiers.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn tier(&self) -> Tier;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, TransportError>;

    /// One-time availability check. Only a failure is acted upon.
    async fn probe(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Analysis as remote services send it. Every field is optional on the
/// wire; [`WireAnalysis::into_analysis`] enforces the required ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireAnalysis {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub entities: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WireAnalysis {
    pub fn into_analysis(self) -> Result<Analysis, TransportError> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(TransportError::Remote(error));
        }

        let response = self
            .response
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| TransportError::Parse("empty response text".to_string()))?;
        let intent = self
            .intent
            .ok_or_else(|| TransportError::Parse("missing intent".to_string()))?
            .parse::<Intent>()
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        let entities = self
            .entities
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| {
                let field = key.parse::<Field>().ok()?;
                let value = match value {
                    Value::String(s) => EntityValue::Text(s),
                    Value::Number(n) => EntityValue::Number(n.as_f64()?),
                    _ => return None,
                };
                Some((field, value))
            })
            .collect();

        Ok(Analysis {
            intent,
            confidence: self.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            entities,
            response,
        })
    }
}
