//! In-process mock of a mailer provider's HTTP API.
//!
//! The automation service's mailer adapters take a configurable base URL;
//! tests point that at a `MockMailServer` and assert on the requests the
//! adapter actually sent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};

/// One request captured by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    respond_status: Arc<AtomicU16>,
}

/// A mailer provider stand-in bound to an ephemeral localhost port.
pub struct MockMailServer {
    addr: SocketAddr,
    state: MockState,
}

impl MockMailServer {
    /// Bind and serve on an ephemeral port. The server task lives until the
    /// test process exits.
    pub async fn spawn() -> Self {
        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            respond_status: Arc::new(AtomicU16::new(200)),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock mail server");
        let addr = listener.local_addr().expect("mock mail server addr");

        let app = Router::new()
            .fallback(record_request)
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock mail server");
        });

        Self { addr, state }
    }

    /// Base URL for pointing a mailer adapter at this server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Status code returned to subsequent requests (default 200).
    pub fn set_response_status(&self, status: u16) {
        self.state.respond_status.store(status, Ordering::SeqCst);
    }

    /// Everything received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn record_request(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let authorization = headers
        .get("authorization")
        .or_else(|| headers.get("x-postmark-server-token"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_owned(),
        authorization,
        body,
    });
    StatusCode::from_u16(state.respond_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
