//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{any, post},
    Json, Router,
};
use course_proxy::config::ForwarderConfig;
use course_proxy::{HttpServer, Shutdown};
use futures_util::stream;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// How long the slow upstream routes hold back.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

/// A running echo upstream.
pub struct Upstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl Upstream {
    /// Number of requests the upstream has received.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A running proxy instance.
pub struct Proxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Proxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start an upstream that reports what it received.
///
/// - `/upload` decodes a multipart body and lists its parts
/// - `/redirect` answers 302 with a `Location` header
/// - `/status/{code}` answers with that status
/// - `/slow` answers after [`SLOW_RESPONSE`]
/// - `/stream` sends `first`, stalls for [`SLOW_RESPONSE`], then sends `rest`
/// - anything else echoes method, path, query, headers and body as JSON,
///   and the method again in `x-upstream-method`
pub async fn start_echo_upstream() -> Upstream {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/upload", post(upload))
        .route("/redirect", any(redirect))
        .route("/status/{code}", any(status))
        .route("/slow", any(slow))
        .route("/stream", any(stalled_stream))
        .fallback(echo)
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream { addr, hits }
}

/// Start a proxy forwarding to `origin`.
pub async fn start_proxy(origin: String) -> Proxy {
    let mut config = ForwarderConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.origin = origin;
    start_proxy_with(config).await
}

/// Start a proxy with a custom configuration.
pub async fn start_proxy_with(config: ForwarderConfig) -> Proxy {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    Proxy { addr, shutdown }
}

/// A client that neither pools connections nor follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        map.insert(name.as_str().to_string(), values.join(", "));
    }
    map
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let body: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (
        [
            ("x-upstream", "echo".to_string()),
            ("x-upstream-method", parts.method.to_string()),
        ],
        Json(json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "headers": header_map(&parts.headers),
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

async fn upload(State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap, mut multipart: Multipart) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_owned);
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.unwrap();
        parts.push(json!({
            "name": name,
            "filename": filename,
            "content_type": content_type,
            "data": String::from_utf8_lossy(&data),
        }));
    }

    Json(json!({
        "content_type": headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        "parts": parts,
    }))
}

async fn redirect(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FOUND, [(header::LOCATION, "/login?next=/courses")])
}

async fn status(State(hits): State<Arc<AtomicUsize>>, Path(code): Path<u16>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(code).unwrap();
    (status, format!("upstream said {}", code))
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(SLOW_RESPONSE).await;
    "finally"
}

async fn stalled_stream(State(hits): State<Arc<AtomicUsize>>) -> Body {
    hits.fetch_add(1, Ordering::SeqCst);
    let chunks = stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok::<_, std::convert::Infallible>(Bytes::from_static(b"first")), 1)),
            1 => {
                tokio::time::sleep(SLOW_RESPONSE).await;
                Some((Ok(Bytes::from_static(b"rest")), 2))
            }
            _ => None,
        }
    });
    Body::from_stream(chunks)
}
