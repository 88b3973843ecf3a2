//! Integration tests for the Casemandu storefront.
//!
//! The tests run the real storefront library against [`StubApi`], an `axum`
//! server that plays the external Casemandu API on an ephemeral port. No
//! network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p casemandu-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - brand, model and case-type resolution, stale responses
//! - `orders` - checkout end to end, backend rejections, duplicate submits

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use casemandu_storefront::catalog::CASE_TYPE_ENDPOINTS;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned responses served by the stub.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Body of `GET /api/phones/brands`.
    pub brands: Value,
    /// Body and delay of `GET /api/phones/brands/{id}`, by brand ID.
    pub models: HashMap<String, (Value, Duration)>,
    /// Bodies of the case-type endpoints, by path. Unlisted paths are 404.
    pub case_types: HashMap<&'static str, Value>,
    /// Body of `GET /api/promocodes`.
    pub promos: Value,
    /// Status and raw body of `POST /api/orders`.
    pub order_response: (u16, String),
    /// Delay before answering `POST /api/orders`.
    pub order_delay: Duration,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            brands: json!([]),
            models: HashMap::new(),
            case_types: HashMap::new(),
            promos: json!([]),
            order_response: (201, json!({"data": {"_id": "order-1"}}).to_string()),
            order_delay: Duration::ZERO,
        }
    }
}

impl StubConfig {
    #[must_use]
    pub fn with_models(mut self, brand_id: &str, body: Value) -> Self {
        self.models
            .insert(brand_id.to_string(), (body, Duration::ZERO));
        self
    }

    #[must_use]
    pub fn with_slow_models(mut self, brand_id: &str, body: Value, delay: Duration) -> Self {
        self.models.insert(brand_id.to_string(), (body, delay));
        self
    }

    #[must_use]
    pub fn with_order_response(mut self, status: u16, body: impl Into<String>) -> Self {
        self.order_response = (status, body.into());
        self
    }
}

/// A file part received by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One `POST /api/orders` as the stub saw it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedOrder {
    pub fields: Vec<(String, String)>,
    pub files: Vec<ReceivedFile>,
    pub content_type: String,
}

impl ReceivedOrder {
    /// Value of the text field `name`, if sent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// The text field `name` parsed as JSON.
    #[must_use]
    pub fn json_field(&self, name: &str) -> Option<Value> {
        serde_json::from_str(self.field(name)?).ok()
    }

    /// File names sent under `field`, in order.
    #[must_use]
    pub fn file_names(&self, field: &str) -> Vec<&str> {
        self.files
            .iter()
            .filter(|file| file.field == field)
            .map(|file| file.file_name.as_str())
            .collect()
    }
}

#[derive(Debug, Default)]
struct Recorded {
    requests: Vec<String>,
    orders: Vec<ReceivedOrder>,
}

#[derive(Debug)]
struct StubState {
    config: StubConfig,
    recorded: Mutex<Recorded>,
}

impl StubState {
    fn record<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }
}

/// A running stub of the external API. Shut down on drop.
#[derive(Debug)]
pub struct StubApi {
    addr: SocketAddr,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubApi {
    /// Start the stub on `127.0.0.1` with an OS-assigned port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(config: StubConfig) -> std::io::Result<Self> {
        let state = Arc::new(StubState {
            config,
            recorded: Mutex::new(Recorded::default()),
        });

        let mut app = Router::new()
            .route("/api/phones/brands", get(brands))
            .route("/api/phones/brands/{brand_id}", get(models))
            .route("/api/promocodes", get(promos))
            .route("/api/orders", post(create_order));
        for path in CASE_TYPE_ENDPOINTS {
            app = app.route(path, get(case_types));
        }
        let app = app.with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL to configure the storefront with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Paths requested so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.record(|r| r.requests.clone())
    }

    /// Orders received so far.
    #[must_use]
    pub fn orders(&self) -> Vec<ReceivedOrder> {
        self.state.record(|r| r.orders.clone())
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

type Shared = State<Arc<StubState>>;

async fn brands(State(state): Shared, uri: Uri) -> Json<Value> {
    state.record(|r| r.requests.push(uri.path().to_string()));
    Json(state.config.brands.clone())
}

async fn models(State(state): Shared, Path(brand_id): Path<String>, uri: Uri) -> Response {
    state.record(|r| r.requests.push(uri.path().to_string()));
    let Some((body, delay)) = state.config.models.get(&brand_id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    tokio::time::sleep(delay).await;
    Json(body).into_response()
}

async fn case_types(State(state): Shared, uri: Uri) -> Response {
    let path = uri.path().to_string();
    state.record(|r| r.requests.push(path.clone()));
    match state.config.case_types.get(path.as_str()) {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn promos(State(state): Shared, uri: Uri) -> Json<Value> {
    state.record(|r| r.requests.push(uri.path().to_string()));
    Json(state.config.promos.clone())
}

async fn create_order(
    State(state): Shared,
    headers: axum::http::HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut order = ReceivedOrder {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        ..ReceivedOrder::default()
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };

        match file_name {
            Some(file_name) => order.files.push(ReceivedFile {
                field: name,
                file_name,
                bytes: bytes.to_vec(),
            }),
            None => order
                .fields
                .push((name, String::from_utf8_lossy(&bytes).into_owned())),
        }
    }

    state.record(|r| {
        r.requests.push("/api/orders".to_string());
        r.orders.push(order);
    });

    tokio::time::sleep(state.config.order_delay).await;

    let (status, body) = state.config.order_response.clone();
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
