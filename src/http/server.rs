//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state (breaker, store, workflow) once
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::orders;
use crate::http::request::MakeRequestUuid;
use crate::observability::metrics;
use crate::orders::{OrderStore, OrderWorkflow};
use crate::parts::{PartsClient, PartsClientError, PartsSource};
use crate::resilience::CircuitBreaker;

/// Application state injected into handlers.
///
/// Constructed once per process; clones share the same breaker and store.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<OrderWorkflow>,
    pub store: Arc<OrderStore>,
    pub breaker: Arc<CircuitBreaker>,
}

impl AppState {
    /// State backed by the HTTP parts client.
    pub fn new(config: &ServiceConfig) -> Result<Self, PartsClientError> {
        let client = PartsClient::new(&config.parts)?;
        Ok(Self::with_parts(config, Arc::new(client)))
    }

    /// State backed by an arbitrary parts source.
    pub fn with_parts(config: &ServiceConfig, parts: Arc<dyn PartsSource>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new("parts", &config.breaker));
        let store = Arc::new(OrderStore::new());
        let workflow = Arc::new(OrderWorkflow::new(parts, breaker.clone(), store.clone()));
        Self {
            workflow,
            store,
            breaker,
        }
    }
}

/// HTTP server for the order service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, PartsClientError> {
        let state = AppState::new(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around already-built state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(orders::health))
            .route(
                "/api/orders",
                get(orders::list_orders).post(orders::create_order),
            )
            .route(
                "/api/orders/{order_id}",
                get(orders::get_order).delete(orders::delete_order),
            )
            .route_layer(middleware::from_fn(metrics::track_requests))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
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
            parts_url = %self.config.parts.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{DependencyFailure, PartLookup, PartSnapshot};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures_util::future::{BoxFuture, FutureExt};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    /// Part 1 has 5 in stock at 10.0; part 2 is unreachable; everything else is unknown.
    struct StaticParts;

    impl PartsSource for StaticParts {
        fn fetch_part(&self, part_id: u64) -> BoxFuture<'_, Result<PartLookup, DependencyFailure>> {
            let answer = match part_id {
                1 => Ok(PartLookup::Found(PartSnapshot {
                    part_id,
                    stock: 5,
                    unit_price: Decimal::from(10),
                })),
                2 => Err(DependencyFailure::Transport("connection refused".into())),
                _ => Ok(PartLookup::NotFound),
            };
            async move { answer }.boxed()
        }
    }

    fn server() -> HttpServer {
        let mut config = ServiceConfig::default();
        config.breaker.failure_threshold = 2;
        let state = AppState::with_parts(&config, Arc::new(StaticParts));
        HttpServer::with_state(config, state)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_order(json: &str) -> Request<Body> {
        Request::post("/api/orders")
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_order() {
        let router = server().router();

        let (status, body) =
            send(&router, post_order(r#"{"user_id":1,"part_id":1,"quantity":3}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order_id"], 1);
        assert_eq!(body["total_price"].as_f64(), Some(30.0));

        let (status, body) = send(&router, get("/api/orders/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "created");

        let (status, body) = send(&router, get("/api/orders")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = server().router();

        let (status, body) =
            send(&router, post_order(r#"{"user_id":1,"part_id":1,"quantity":10}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "insufficient stock, available=5");

        let (status, body) = send(&router, post_order(r#"{"user_id":1,"part_id":9}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "part does not exist");

        let (status, _) = send(&router, post_order(r#"{"user_id":0,"part_id":1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&router, post_order(r#"{"user_id":1,"part_id":2}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "dependency unavailable");

        let (status, body) = send(&router, get("/api/orders/77")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "order not found");
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let router = server().router();

        for json in [
            r#"{"part_id":1}"#,
            r#"{"user_id":"x","part_id":1}"#,
            r#"{"user_id":1,"part_id":1,"quantity":1.5}"#,
            r#"{"user_id":1e20,"part_id":1}"#,
            "not json",
        ] {
            let (status, body) = send(&router, post_order(json)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {json}");
            assert!(body["detail"].is_string(), "body {json}");
        }

        let (_, body) = send(&router, post_order(r#"{"part_id":1}"#)).await;
        assert!(body["detail"].as_str().unwrap().contains("user_id"));

        let (_, body) = send(&router, get("/api/orders")).await;
        assert_eq!(body.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_open_breaker_reported_on_health() {
        let router = server().router();

        for _ in 0..2 {
            send(&router, post_order(r#"{"user_id":1,"part_id":2}"#)).await;
        }
        let (status, body) = send(&router, post_order(r#"{"user_id":1,"part_id":1}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "dependency temporarily unavailable, retry later");

        let (status, body) = send(&router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["dependency"]["state"], "open");
        assert_eq!(body["dependency"]["consecutive_failures"], 2);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let router = server().router();
        send(&router, post_order(r#"{"user_id":1,"part_id":1}"#)).await;

        let delete = || Request::delete("/api/orders/1").body(Body::empty()).unwrap();
        let (status, _) = send(&router, delete()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let router = server().router();
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
