use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ApiError;

/// Header used to correlate a dashboard request with the backend's own logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// ApiRequest
///
/// One call against the portfolio API, described independently of the transport.
/// `path` is relative to the configured base URL and always starts with `/`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// 1. Backend Contract
/// Backend
///
/// The transport seam between the dashboard and the portfolio REST API. The typed
/// `ApiClient` builds `ApiRequest`s and decodes the JSON it gets back; implementations
/// only move bytes and map HTTP failures onto `ApiError`.
///
/// A successful call yields the parsed JSON body, or `Value::Null` when the body is empty
/// (logout and delete answer with a bare 200).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;

    /// Installs (or clears) the bearer credential attached to every later request.
    fn set_access_token(&self, token: Option<String>);

    fn access_token(&self) -> Option<String>;
}

/// BackendState
///
/// The shared handle every component holds.
pub type BackendState = Arc<dyn Backend>;

// 2. The Real Implementation
/// HttpBackend
///
/// reqwest-backed transport. Keeps a cookie store so the session cookie set by
/// `/auth/login` rides along with later calls, and attaches the bearer token when one
/// has been installed.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!(
            "backend_request",
            method = %request.method,
            path = %request.path,
            req_id = %request_id,
        );

        async move {
            let url = format!("{}{}", self.base_url, request.path);
            let mut builder = self
                .client
                .request(request.method.into(), url)
                .header(REQUEST_ID_HEADER, &request_id);

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            let token = self.token.read().clone();
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                tracing::warn!(error = %e, "request failed before a response arrived");
                ApiError::from(e)
            })?;

            let status = response.status();
            let bytes = response.bytes().await?;
            tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "response received");

            if !status.is_success() {
                // Error bodies carry `{ message }`; anything else leaves the message empty.
                let message = serde_json::from_slice::<Value>(&bytes)
                    .ok()
                    .and_then(|body| body.get("message")?.as_str().map(str::to_string));
                return Err(ApiError::Server {
                    status: status.as_u16(),
                    message,
                });
            }

            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_slice(&bytes)?)
        }
        .instrument(span)
        .await
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

// 3. The Mock Implementation (For Tests)
/// MockReply
///
/// One scripted answer. A reply can be held back behind a gate so tests can resolve
/// requests out of order.
pub struct MockReply {
    result: Result<Value, ApiError>,
    gate: Option<oneshot::Receiver<()>>,
}

impl MockReply {
    pub fn ok(body: Value) -> Self {
        Self {
            result: Ok(body),
            gate: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            result: Err(error),
            gate: None,
        }
    }

    /// Holds this reply until the returned sender fires (or is dropped).
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Some(rx);
        (self, tx)
    }
}

/// MockBackend
///
/// In-memory `Backend` for tests. Replies are queued per method and path (query strings
/// are not part of the key); every request is recorded for later assertions. An
/// unscripted call answers with a 404 carrying no message.
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    calls: Mutex<Vec<ApiRequest>>,
    token: RwLock<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, method: Method, path: &str, reply: MockReply) {
        self.replies
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.enqueue(method, path, MockReply::ok(body));
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.enqueue(method, path, MockReply::err(error));
    }

    /// Queues a reply that resolves only when the returned sender fires.
    pub fn respond_gated(&self, method: Method, path: &str, body: Value) -> oneshot::Sender<()> {
        let (reply, gate) = MockReply::ok(body).gated();
        self.enqueue(method, path, reply);
        gate
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = (request.method, request.path.clone());
        self.calls.lock().push(request);

        // The lock is released before awaiting the gate.
        let reply = self
            .replies
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(MockReply { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Err(ApiError::Server {
                status: 404,
                message: None,
            }),
        }
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
