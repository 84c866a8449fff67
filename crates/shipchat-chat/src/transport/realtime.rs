//! Realtime tier over a persistent duplex channel.
//!
//! Framing is one JSON object per line: `{"event": "...", "data": {...}}`.
//! Outbound `chat_message` frames carry a `requestId`; the server echoes it
//! on the `chat_status` and `chat_response` frames that answer the request.
//! Frames for other request ids are skipped.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shipchat_core::config::RealtimeConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::TransportError;
use crate::transport::{Analysis, AnalysisRequest, Analyzer, Tier, WireAnalysis};

pub const CHAT_MESSAGE: &str = "chat_message";
pub const CHAT_STATUS: &str = "chat_status";
pub const CHAT_RESPONSE: &str = "chat_response";

/// One event on the duplex channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn request_id(&self) -> Option<&str> {
        self.data.get("requestId").and_then(Value::as_str)
    }
}

/// Opens duplex connections.
#[async_trait]
pub trait DuplexConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DuplexConnection>, TransportError>;
}

/// An open duplex channel.
#[async_trait]
pub trait DuplexConnection: Send {
    async fn send(&mut self, frame: &Frame) -> Result<(), TransportError>;

    /// Next inbound frame; `None` once the peer closed the channel.
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;
}

// =============================================================================
// TCP implementation
// =============================================================================

/// Connects to a JSON-lines TCP endpoint.
pub struct TcpConnector {
    address: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(config.address.clone(), config.connect_timeout())
    }
}

#[async_trait]
impl DuplexConnector for TcpConnector {
    async fn connect(&self) -> Result<Box<dyn DuplexConnection>, TransportError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout.as_millis() as u64))?
            .map_err(|e| TransportError::Connection(format!("{}: {}", self.address, e)))?;

        let (reader, writer) = stream.into_split();
        tracing::debug!(address = %self.address, "Realtime channel connected");
        Ok(Box::new(TcpConnection {
            lines: BufReader::new(reader).lines(),
            writer,
        }))
    }
}

struct TcpConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

#[async_trait]
impl DuplexConnection for TcpConnection {
    async fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            match line {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(serde_json::from_str(&line)?)),
                None => return Ok(None),
            }
        }
    }
}

// =============================================================================
// Analyzer
// =============================================================================

/// Keeps one connection open across messages and reconnects lazily.
pub struct RealtimeAnalyzer {
    connector: Box<dyn DuplexConnector>,
    connection: Mutex<Option<Box<dyn DuplexConnection>>>,
    response_timeout: Duration,
}

impl RealtimeAnalyzer {
    pub fn new(connector: Box<dyn DuplexConnector>, response_timeout: Duration) -> Self {
        Self {
            connector,
            connection: Mutex::new(None),
            response_timeout,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    async fn exchange(
        connection: &mut dyn DuplexConnection,
        request_id: &str,
        body: Value,
    ) -> Result<Analysis, TransportError> {
        connection
            .send(&Frame {
                event: CHAT_MESSAGE.to_string(),
                data: body,
            })
            .await?;

        loop {
            let frame = connection
                .recv()
                .await?
                .ok_or_else(|| TransportError::Connection("channel closed".to_string()))?;

            if frame.request_id() != Some(request_id) {
                tracing::debug!(event = %frame.event, "Skipping frame for another request");
                continue;
            }

            match frame.event.as_str() {
                CHAT_STATUS => {
                    tracing::debug!(status = ?frame.data.get("status"), "Realtime status");
                }
                CHAT_RESPONSE => {
                    let wire: WireAnalysis = serde_json::from_value(frame.data)?;
                    return wire.into_analysis();
                }
                other => {
                    tracing::debug!(event = %other, "Ignoring unknown realtime event");
                }
            }
        }
    }
}

#[async_trait]
impl Analyzer for RealtimeAnalyzer {
    fn tier(&self) -> Tier {
        Tier::Realtime
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, TransportError> {
        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.connector.connect().await?);
        }
        let connection = guard
            .as_mut()
            .ok_or_else(|| TransportError::Connection("no open channel".to_string()))?;

        let request_id = Uuid::new_v4().to_string();
        let mut body = serde_json::to_value(request)?;
        if let Value::Object(map) = &mut body {
            map.insert("requestId".to_string(), Value::String(request_id.clone()));
        }

        let outcome = tokio::time::timeout(
            self.response_timeout,
            Self::exchange(&mut **connection, &request_id, body),
        )
        .await;

        match outcome {
            Ok(Ok(analysis)) => Ok(analysis),
            Ok(Err(err)) => {
                *guard = None;
                Err(err)
            }
            Err(_) => {
                *guard = None;
                Err(TransportError::Timeout(self.response_timeout.as_millis() as u64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::DialogueSnapshot;
    use serde_json::json;
    use shipchat_core::{Credential, Intent};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    /// Replays canned replies. `{id}` placeholders in `requestId` are
    /// replaced by the id of the last sent frame.
    struct Scripted {
        replies: VecDeque<Frame>,
        last_id: Option<String>,
        sent: Arc<StdMutex<Vec<Frame>>>,
    }

    #[async_trait]
    impl DuplexConnection for Scripted {
        async fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
            self.last_id = frame.request_id().map(str::to_string);
            self.sent.lock().unwrap().push(frame.clone());
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
            match self.replies.pop_front() {
                Some(mut frame) => {
                    if frame.request_id() == Some("{id}") {
                        frame.data["requestId"] = json!(self.last_id.clone());
                    }
                    Ok(Some(frame))
                }
                None => std::future::pending().await,
            }
        }
    }

    struct ScriptedConnector {
        replies: Vec<Frame>,
        connects: Arc<AtomicUsize>,
        sent: Arc<StdMutex<Vec<Frame>>>,
    }

    #[async_trait]
    impl DuplexConnector for ScriptedConnector {
        async fn connect(&self) -> Result<Box<dyn DuplexConnection>, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Scripted {
                replies: self.replies.clone().into(),
                last_id: None,
                sent: Arc::clone(&self.sent),
            }))
        }
    }

    fn frame(event: &str, data: Value) -> Frame {
        Frame {
            event: event.to_string(),
            data,
        }
    }

    fn analyzer(replies: Vec<Frame>) -> (RealtimeAnalyzer, Arc<AtomicUsize>, Arc<StdMutex<Vec<Frame>>>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let connector = ScriptedConnector {
            replies,
            connects: Arc::clone(&connects),
            sent: Arc::clone(&sent),
        };
        (
            RealtimeAnalyzer::new(Box::new(connector), Duration::from_millis(200)),
            connects,
            sent,
        )
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            message: "شحناتي".to_string(),
            history: Vec::new(),
            token: Credential::new("secret"),
            user_name: Some("سارة".to_string()),
            context: DialogueSnapshot::default(),
        }
    }

    #[tokio::test]
    async fn test_correlated_response_after_status_and_noise() {
        let (analyzer, _, sent) = analyzer(vec![
            frame(CHAT_RESPONSE, json!({"requestId": "other", "response": "x", "intent": "info"})),
            frame(CHAT_STATUS, json!({"requestId": "{id}", "status": "thinking"})),
            frame(
                CHAT_RESPONSE,
                json!({"requestId": "{id}", "response": "📋 شحناتك", "intent": "get_shipments", "confidence": 0.8}),
            ),
        ]);

        let analysis = analyzer.analyze(&request()).await.unwrap();
        assert_eq!(analysis.intent, Intent::GetShipments);
        assert_eq!(analysis.response, "📋 شحناتك");

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].event, CHAT_MESSAGE);
        assert_eq!(sent[0].data["message"], "شحناتي");
        assert_eq!(sent[0].data["token"], "secret");
        assert!(sent[0].request_id().is_some());
    }

    #[tokio::test]
    async fn test_connection_is_reused() {
        let reply = frame(
            CHAT_RESPONSE,
            json!({"requestId": "{id}", "response": "ok", "intent": "greeting"}),
        );
        let (analyzer, connects, _) = analyzer(vec![reply.clone(), reply]);

        analyzer.analyze(&request()).await.unwrap();
        analyzer.analyze(&request()).await.unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(analyzer.is_connected().await);
    }

    #[tokio::test]
    async fn test_silence_times_out_and_drops_connection() {
        let (analyzer, _, _) = analyzer(vec![]);
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(200)));
        assert!(!analyzer.is_connected().await);
    }

    #[tokio::test]
    async fn test_error_payload_is_remote_error() {
        let (analyzer, _, _) = analyzer(vec![frame(
            CHAT_RESPONSE,
            json!({"requestId": "{id}", "error": "model unavailable"}),
        )]);
        let err = analyzer.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Remote(_)));
    }

    #[test]
    fn test_frame_wire_format() {
        let line = serde_json::to_string(&frame(CHAT_STATUS, json!({"status": "ok"}))).unwrap();
        assert_eq!(line, r#"{"event":"chat_status","data":{"status":"ok"}}"#);
        let parsed: Frame = serde_json::from_str(r#"{"event":"chat_status"}"#).unwrap();
        assert_eq!(parsed.data, Value::Null);
    }
}
