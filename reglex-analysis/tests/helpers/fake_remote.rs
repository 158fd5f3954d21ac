//! In-process stand-in for the remote analysis service
//!
//! Serves `GET /health` and `POST /upload` on an ephemeral loopback port.
//! Upload responses are scripted per call; once the script runs out, every
//! upload gets the default response.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// What the fake saw in one upload
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub file_size: usize,
    pub lang: Option<String>,
}

struct FakeState {
    healthy: AtomicBool,
    health_hits: AtomicUsize,
    upload_hits: AtomicUsize,
    script: Mutex<VecDeque<(u16, Value)>>,
    default_response: Mutex<(u16, Value)>,
    received: Mutex<Vec<ReceivedUpload>>,
}

pub struct FakeRemote {
    pub base_url: String,
    state: Arc<FakeState>,
    handle: JoinHandle<()>,
}

impl FakeRemote {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            healthy: AtomicBool::new(true),
            health_hits: AtomicUsize::new(0),
            upload_hits: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            default_response: Mutex::new((200, analysis_payload(8, 10))),
            received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(health))
            .route("/upload", post(upload))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Queue the response for the next upload
    pub fn push_response(&self, status: u16, body: Value) {
        self.state.script.lock().unwrap().push_back((status, body));
    }

    pub fn set_default_response(&self, status: u16, body: Value) {
        *self.state.default_response.lock().unwrap() = (status, body);
    }

    pub fn health_hits(&self) -> usize {
        self.state.health_hits.load(Ordering::SeqCst)
    }

    pub fn upload_hits(&self) -> usize {
        self.state.upload_hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<ReceivedUpload> {
        self.state.received.lock().unwrap().clone()
    }
}

impl Drop for FakeRemote {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn health(State(state): State<Arc<FakeState>>) -> (StatusCode, Json<Value>) {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    if state.healthy.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({"status": "ok", "message": "ready"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "error", "message": "down"})),
        )
    }
}

async fn upload(
    State(state): State<Arc<FakeState>>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    state.upload_hits.fetch_add(1, Ordering::SeqCst);

    let mut received = ReceivedUpload::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                received.file_name = field.file_name().map(str::to_string);
                received.file_size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
            Some("lang") => received.lang = field.text().await.ok(),
            _ => {}
        }
    }
    state.received.lock().unwrap().push(received);

    let (status, body) = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| state.default_response.lock().unwrap().clone());

    (StatusCode::from_u16(status).unwrap(), Json(body))
}

/// Remote-shaped payload with `total` verdicts, the first `compliant` passing
pub fn analysis_payload(compliant: usize, total: usize) -> Value {
    let clauses: Vec<Value> = (1..=total)
        .map(|i| json!({"clause_id": format!("C-{}", i), "text_en": format!("Clause text {}", i)}))
        .collect();

    let verification_results: Vec<Value> = (1..=total)
        .map(|i| {
            json!({
                "clause": format!("Clause text {}", i),
                "is_compliant": i <= compliant,
                "final_reason": if i <= compliant { "Meets requirements" } else { "Missing disclosure" },
                "Section": "Banking"
            })
        })
        .collect();

    let risk_explanations: Vec<Value> = (1..=total)
        .map(|i| {
            if i <= compliant {
                json!({"severity": "None", "category": "None"})
            } else {
                json!({
                    "severity": "High",
                    "category": "Legal",
                    "risk_score": 0.8,
                    "impact": "Regulatory penalty",
                    "mitigation": "Add the required disclosure"
                })
            }
        })
        .collect();

    json!({
        "document_id": "doc-123",
        "summary": "Services agreement between two parties.",
        "timelines": {"effective": "2024-01-01"},
        "clauses": clauses,
        "compliance_results": {
            "verification_results": verification_results,
            "risk_explanations": risk_explanations,
            "compliance_stats": {"total_clauses": total}
        }
    })
}
