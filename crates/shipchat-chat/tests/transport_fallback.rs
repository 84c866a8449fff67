//! Fallback chain against in-process fake services: a JSON-lines TCP server
//! for the realtime tier and an axum app for the HTTP tier.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use shipchat_action::{ActionDispatcher, ActionRegistry};
use shipchat_chat::{
    ChatEngine, RealtimeAnalyzer, RemoteHttpAnalyzer, TcpConnector, Tier, TierHealth,
};
use shipchat_core::{ConversationContext, Credential};
use shipchat_nlu::{FirstChoice, IntentRegistry, CAPABILITY_OVERVIEW};

// =============================================================================
// Fake realtime server
// =============================================================================

#[derive(Default)]
struct RealtimeLog {
    received: AtomicUsize,
    last: Mutex<Option<Value>>,
}

/// Start a JSON-lines server. With `reply = None` it reads but never answers.
async fn spawn_realtime(reply: Option<Value>) -> (SocketAddr, Arc<RealtimeLog>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(RealtimeLog::default());
    let server_log = Arc::clone(&log);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = reply.clone();
            let log = Arc::clone(&server_log);
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut lines = BufReader::new(reader).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let frame: Value = serde_json::from_str(&line).unwrap();
                    assert_eq!(frame["event"], "chat_message");
                    log.received.fetch_add(1, Ordering::SeqCst);
                    *log.last.lock().unwrap() = Some(frame["data"].clone());

                    let Some(reply) = &reply else { continue };
                    let id = frame["data"]["requestId"].clone();
                    let mut data = reply.clone();
                    data["requestId"] = id.clone();
                    let frames = [
                        json!({"event": "chat_status", "data": {"requestId": id, "status": "processing"}}),
                        json!({"event": "chat_response", "data": data}),
                    ];
                    for frame in frames {
                        let line = format!("{}\n", frame);
                        if writer.write_all(line.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    (addr, log)
}

/// An address nothing listens on.
async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

// =============================================================================
// Fake HTTP inference service
// =============================================================================

#[derive(Default)]
struct HttpLog {
    chat_calls: AtomicUsize,
    healthy: bool,
    broken: bool,
}

async fn chat(State(log): State<Arc<HttpLog>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    log.chat_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["token"], "tok");
    if log.broken {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "response": "👋 أهلاً من خدمة التحليل",
            "intent": "greeting",
            "confidence": 0.92,
            "entities": {}
        })),
    )
}

async fn health(State(log): State<Arc<HttpLog>>) -> StatusCode {
    if log.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn spawn_http(healthy: bool, broken: bool) -> (String, Arc<HttpLog>) {
    let log = Arc::new(HttpLog {
        healthy,
        broken,
        ..HttpLog::default()
    });
    let app = Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .with_state(Arc::clone(&log));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), log)
}

// =============================================================================
// Engine wiring
// =============================================================================

fn engine(realtime: Option<SocketAddr>, http: Option<&str>) -> ChatEngine {
    let mut engine = ChatEngine::new(
        Arc::new(IntentRegistry::standard()),
        ActionDispatcher::new(Arc::new(ActionRegistry::new())),
        ConversationContext::new(Credential::new("tok")).with_user_name("سارة"),
        Box::new(FirstChoice),
    );

    if let Some(addr) = realtime {
        let connector = TcpConnector::new(addr.to_string(), Duration::from_secs(1));
        engine = engine.with_analyzer(Box::new(RealtimeAnalyzer::new(
            Box::new(connector),
            Duration::from_millis(300),
        )));
    }
    if let Some(base_url) = http {
        let analyzer = RemoteHttpAnalyzer::new(base_url, Duration::from_secs(2)).unwrap();
        engine = engine.with_analyzer(Box::new(analyzer));
    }
    engine
}

fn thanks_reply() -> Value {
    json!({
        "response": "🙏 العفو من القناة الفورية",
        "intent": "thanks",
        "confidence": 0.95,
        "entities": {},
        "data": null
    })
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_realtime_answers_first() {
    let (rt_addr, rt_log) = spawn_realtime(Some(thanks_reply())).await;
    let (http_url, http_log) = spawn_http(true, false).await;
    let mut engine = engine(Some(rt_addr), Some(&http_url));

    let reply = engine.process_message("شكرا جزيلا").await;
    assert_eq!(reply.content, "🙏 العفو من القناة الفورية");
    assert_eq!(engine.tier_health(Tier::Realtime), TierHealth::Healthy);
    assert_eq!(http_log.chat_calls.load(Ordering::SeqCst), 0);

    let sent = rt_log.last.lock().unwrap().clone().unwrap();
    assert_eq!(sent["message"], "شكرا جزيلا");
    assert_eq!(sent["token"], "tok");
    assert_eq!(sent["userName"], "سارة");
    assert!(sent["history"].as_array().unwrap().is_empty());

    engine.process_message("شكرا مرة أخرى").await;
    assert_eq!(rt_log.received.load(Ordering::SeqCst), 2);
    let sent = rt_log.last.lock().unwrap().clone().unwrap();
    assert_eq!(sent["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_realtime_timeout_falls_back_to_http_and_stays_degraded() {
    let (rt_addr, rt_log) = spawn_realtime(None).await;
    let (http_url, http_log) = spawn_http(true, false).await;
    let mut engine = engine(Some(rt_addr), Some(&http_url));

    let reply = engine.process_message("مرحبا").await;
    assert_eq!(reply.content, "👋 أهلاً من خدمة التحليل");
    assert_eq!(engine.tier_health(Tier::Realtime), TierHealth::Degraded);
    assert_eq!(engine.tier_health(Tier::RemoteHttp), TierHealth::Healthy);

    let reply = engine.process_message("مرحبا مجددا").await;
    assert_eq!(reply.content, "👋 أهلاً من خدمة التحليل");
    assert_eq!(rt_log.received.load(Ordering::SeqCst), 1);
    assert_eq!(http_log.chat_calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.history().len(), 4);
}

#[tokio::test]
async fn test_all_remote_tiers_fail_local_answers() {
    let (http_url, http_log) = spawn_http(true, true).await;
    let mut engine = engine(Some(closed_address().await), Some(&http_url));

    let reply = engine.process_message("كلام لا علاقة له بشيء").await;
    assert_eq!(reply.content, CAPABILITY_OVERVIEW);
    assert_eq!(engine.tier_health(Tier::Realtime), TierHealth::Degraded);
    assert_eq!(engine.tier_health(Tier::RemoteHttp), TierHealth::Degraded);
    assert_eq!(http_log.chat_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.tier_order(), vec![Tier::Local]);
}

#[tokio::test]
async fn test_failed_health_probe_disables_http_tier() {
    let (http_url, http_log) = spawn_http(false, false).await;
    let mut engine = engine(None, Some(&http_url));
    engine.probe_tiers().await;
    assert_eq!(engine.tier_health(Tier::RemoteHttp), TierHealth::Degraded);

    let reply = engine.process_message("مرحبا").await;
    assert!(!reply.content.is_empty());
    assert_eq!(http_log.chat_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_passing_probe_leaves_tier_untested() {
    let (http_url, _) = spawn_http(true, false).await;
    let mut engine = engine(None, Some(&http_url));
    engine.probe_tiers().await;
    assert_eq!(engine.tier_health(Tier::RemoteHttp), TierHealth::Untested);
}
