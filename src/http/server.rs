//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding routes under the local prefix
//! - Wire up middleware (request ID, tracing, body limit)
//! - Serve until the shutdown signal fires
//! - Record per-request metrics

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Path, Request, State},
    handler::Handler,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ForwarderConfig;
use crate::forward::RequestForwarder;
use crate::http::request::{request_id, RequestUuid};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<RequestForwarder>,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    config: ForwarderConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ForwarderConfig) -> Result<Self, reqwest::Error> {
        let forwarder = Arc::new(RequestForwarder::new(&config)?);

        tracing::info!(
            origin = %forwarder.origin(),
            prefix = %config.listener.prefix,
            "Forwarder initialized"
        );

        let router = Self::build_router(&config, AppState { forwarder });
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ForwarderConfig, state: AppState) -> Router {
        let prefix = config.listener.prefix.as_str();

        Router::new()
            .route(prefix, forwarding_methods(forward_root))
            .route(&format!("{}/{{*path}}", prefix), forwarding_methods(forward_path))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(RequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for serving on a custom listener or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.listener.prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }
}

/// One entry point per forwarded method, all sharing `handler`.
///
/// Methods not listed here fall through to axum's 405 response.
fn forwarding_methods<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler.clone())
        .post(handler.clone())
        .put(handler.clone())
        .patch(handler.clone())
        .delete(handler)
}

/// Request addressed to the bare prefix.
async fn forward_root(State(state): State<AppState>, request: Request) -> Response {
    dispatch(state, Vec::new(), request).await
}

/// Request addressed below the prefix.
async fn forward_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let segments = path.split('/').map(str::to_owned).collect();
    dispatch(state, segments, request).await
}

async fn dispatch(state: AppState, segments: Vec<String>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        segments = segments.len(),
        "Proxying request"
    );

    match state.forwarder.forward(request, &segments).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), "forwarded", start_time);
            response
        }
        Err(err) => {
            let outcome = if err.is_client_error() {
                tracing::warn!(request_id = %request_id, error = %err, "Rejected request");
                "rejected"
            } else {
                tracing::error!(request_id = %request_id, error = %err, "Upstream error");
                "failed"
            };
            let response = err.into_response();
            metrics::record_request(&method, response.status().as_u16(), outcome, start_time);
            response
        }
    }
}
