//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the geo handler on every path and method
//! - Wire up middleware (request ID, tracing, timeout, panic capture)
//! - Bind server to listener
//! - Graceful shutdown on signal or `Shutdown` broadcast
//! - Outcome metrics per request

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::State,
    http::{HeaderName, Request, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::any,
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::SetRequestIdLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, GeoConfig, ValidationError};
use crate::geo::{build_response, GeoResponse};
use crate::http::request::{inbound_request, MakeGeoRequestId, X_REQUEST_ID};
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub metadata_header: Arc<HeaderName>,
}

/// HTTP server for the geo endpoint.
pub struct HttpServer {
    router: Router,
    config: GeoConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GeoConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let metadata_header = HeaderName::from_bytes(config.metadata.header.as_bytes())
            .map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidHeaderName(
                    config.metadata.header.clone(),
                )])
            })?;

        let state = AppState {
            metadata_header: Arc::new(metadata_header),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GeoConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(geo_handler))
            .route("/", any(geo_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(map_response(timeout_response::<Body>))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static(X_REQUEST_ID),
                MakeGeoRequestId,
            ))
    }

    /// The router with all layers, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            metadata_header = %self.config.metadata.header,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = wait_for_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GeoConfig {
        &self.config
    }
}

/// Geo handler. Every path and method lands here.
async fn geo_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, _body) = request.into_parts();

    tracing::debug!(method = %parts.method, path = %parts.uri.path(), "Handling geo request");

    let response = build_response(inbound_request(&parts, &state.metadata_header));
    metrics::record_request(response.kind.as_str(), response.status.as_u16(), start_time);
    response.into_response()
}

/// Render a caught panic as the unexpected-failure outcome.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "request handler panicked".to_string()
    };

    tracing::error!(error = %details, "Request handler panicked");
    let response = GeoResponse::failure(None, details);
    metrics::record_outcome(response.kind.as_str(), response.status.as_u16());
    response.into_response()
}

/// Replace the timeout layer's bare 408 with the unexpected-failure outcome.
///
/// The geo handler never answers 408 itself, so the status identifies it.
async fn timeout_response<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response.map(Body::new);
    }

    tracing::error!("Request timed out");
    let response = GeoResponse::failure(None, "request timed out");
    metrics::record_outcome(response.kind.as_str(), response.status.as_u16());
    response.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::KeyLog;
    use tower::ServiceExt;

    async fn read_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_panic_payload_becomes_failure_body() {
        let response = panic_response(Box::new("metadata accessor exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = read_body(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["error_details"], "metadata accessor exploded");
        assert_eq!(body["query"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_panic_payload() {
        let response = panic_response(Box::new(42u32));
        let body = read_body(response).await;
        assert_eq!(body["error_details"], "request handler panicked");
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = GeoConfig::default();
        config.timeouts.request_secs = 0;
        assert!(matches!(HttpServer::new(config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_panic_counts_without_latency() {
        let log = KeyLog::default();
        ::metrics::with_local_recorder(&log, || {
            let _ = panic_response(Box::new("boom"));
        });
        assert_eq!(log.names(), vec!["geo_requests_total"]);
    }

    #[allow(deprecated)]
    #[tokio::test]
    async fn test_timeout_becomes_failure_body() {
        let app = Router::new()
            .route(
                "/",
                any(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(10)))
            .layer(map_response(timeout_response::<Body>));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = read_body(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["error_details"], "request timed out");
    }

    #[tokio::test]
    async fn test_non_timeout_response_passes_through() {
        let response = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Body::from("kept"))
            .unwrap();
        let response = timeout_response::<Body>(response).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"kept");
    }
}
