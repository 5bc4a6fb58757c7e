//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Own the application state (identity and both gates)
//! - Create the Axum router with probe, admin and fallback handlers
//! - Wire up timeouts and the middleware pipeline
//! - Serve on a bound listener until shutdown is broadcast

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::RequestBodyTimeoutLayer;

use crate::admin;
use crate::config::ServiceConfig;
use crate::health::probes::{healthz, readyz};
use crate::health::DelayedGate;
use crate::http::middleware::{self, deadline, BodyLimit};
use crate::http::response;

/// Name and version reported by the probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub service: String,
    pub version: String,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<ServiceIdentity>,
    pub health: Arc<DelayedGate>,
    pub ready: Arc<DelayedGate>,
}

impl AppState {
    /// Build the state and start both gates' delay windows.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            identity: Arc::new(ServiceIdentity {
                service: config.service_name.clone(),
                version: config.version.clone(),
            }),
            health: Arc::new(DelayedGate::named("health", config.startup_delay)),
            ready: Arc::new(DelayedGate::named("ready", config.startup_delay)),
        }
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState, config: &ServiceConfig) -> Router {
    let mut router = Router::new()
        .route("/healthz", any(healthz))
        .route("/readyz", any(readyz))
        .merge(admin::router())
        .fallback(response::not_found)
        .with_state(state);

    if !config.write_timeout.is_zero() {
        router = router.layer(from_fn_with_state(
            config.write_timeout,
            deadline::enforce_deadline,
        ));
    }
    if !config.read_timeout.is_zero() {
        router = router.layer(RequestBodyTimeoutLayer::new(config.read_timeout));
    }

    middleware::apply(router, BodyLimit::new(config.max_body_bytes))
}

/// HTTP server for the probe endpoints.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create the server. Both gates start counting down immediately.
    pub fn new(config: &ServiceConfig) -> Self {
        let state = AppState::new(config);
        let router = build_router(state.clone(), config);
        Self { router, state }
    }

    /// Handle on the gates, for callers that drive them directly.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until a value is broadcast on `shutdown`, then stop
    /// accepting and drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A closed channel means the coordinator is gone; stop as well.
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
