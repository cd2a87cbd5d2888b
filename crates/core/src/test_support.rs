//! In-process stand-in for the JSON-blob service, used by the remote backend tests.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct FakeState {
    docs: Arc<Mutex<HashMap<String, Value>>>,
    next_id: Arc<AtomicU64>,
    fail_creates: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

pub(crate) struct FakeBlobServer {
    addr: SocketAddr,
    state: FakeState,
    handle: JoinHandle<()>,
}

impl FakeBlobServer {
    pub(crate) async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/api/jsonBlob", post(create_blob))
            .route("/api/jsonBlob/:id", get(read_blob).put(replace_blob))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake blob server");
        let addr = listener.local_addr().expect("fake blob server addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake blob server");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}/api/jsonBlob", self.addr)
    }

    pub(crate) fn document_count(&self) -> usize {
        self.state.docs.lock().unwrap().len()
    }

    pub(crate) fn document(&self, id: &str) -> Option<Value> {
        self.state.docs.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn put_document(&self, id: &str, body: Value) {
        self.state
            .docs
            .lock()
            .unwrap()
            .insert(id.to_string(), body);
    }

    pub(crate) fn fail_creates(&self, fail: bool) {
        self.state.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Drop for FakeBlobServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_blob(State(state): State<FakeState>, Json(body): Json<Value>) -> Response {
    if state.fail_creates.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let id = format!("blob{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    state.docs.lock().unwrap().insert(id.clone(), body);
    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/jsonBlob/{id}"))],
    )
        .into_response()
}

async fn read_blob(State(state): State<FakeState>, Path(id): Path<String>) -> Response {
    match state.docs.lock().unwrap().get(&id) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn replace_blob(
    State(state): State<FakeState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_writes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut docs = state.docs.lock().unwrap();
    if !docs.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    docs.insert(id, body.clone());
    Json(body).into_response()
}
