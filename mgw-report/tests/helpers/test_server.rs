//! Local stand-in for the Mangrove Watch backend
//!
//! Binds 127.0.0.1 on an ephemeral port, records every `/run-pipeline`
//! multipart field, and replies with whatever the test configured.

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One multipart field as received
#[derive(Debug, Clone)]
pub struct RecordedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl RecordedField {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Clone)]
struct BackendState {
    pipeline_reply: Arc<Mutex<(StatusCode, String)>>,
    points_reply: Arc<Mutex<Value>>,
    submissions: Arc<Mutex<Vec<Vec<RecordedField>>>>,
    points_queries: Arc<Mutex<Vec<String>>>,
}

pub struct TestBackend {
    pub base_url: String,
    state: BackendState,
}

impl TestBackend {
    pub async fn start() -> Self {
        let state = BackendState {
            pipeline_reply: Arc::new(Mutex::new((
                StatusCode::OK,
                json!({"status": "success", "result": {}}).to_string(),
            ))),
            points_reply: Arc::new(Mutex::new(json!({
                "status": "success",
                "data": {"points": 0, "total_reports": 0}
            }))),
            submissions: Arc::new(Mutex::new(Vec::new())),
            points_queries: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/", get(health))
            .route("/run-pipeline", post(run_pipeline))
            .route("/user/points", get(user_points))
            .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Reply for the next `/run-pipeline` requests
    pub fn reply_with(&self, status: StatusCode, body: impl Into<String>) {
        *self.state.pipeline_reply.lock().unwrap() = (status, body.into());
    }

    pub fn points_reply(&self, body: Value) {
        *self.state.points_reply.lock().unwrap() = body;
    }

    pub fn submissions(&self) -> Vec<Vec<RecordedField>> {
        self.state.submissions.lock().unwrap().clone()
    }

    pub fn points_queries(&self) -> Vec<String> {
        self.state.points_queries.lock().unwrap().clone()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"message": "Mangrove Watch API is running"}))
}

async fn run_pipeline(State(state): State<BackendState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        fields.push(RecordedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.submissions.lock().unwrap().push(fields);

    let (status, body) = state.pipeline_reply.lock().unwrap().clone();
    (status, [("content-type", "application/json")], body)
}

async fn user_points(
    State(state): State<BackendState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .points_queries
        .lock()
        .unwrap()
        .push(params.get("user_id").cloned().unwrap_or_default());
    Json(state.points_reply.lock().unwrap().clone())
}
