//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//! - Turn a termination signal into a bounded graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The server runs in its own task so the drain can be bounded and aborted

use std::future::Future;
use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use metrics_exporter_prometheus::BuildError;
use tokio::net::TcpListener;
use tokio::task::JoinError;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Errors that end the process after configuration has loaded.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("in-flight requests still running after {0:?}")]
    ShutdownTimeout(Duration),
}

/// Run the service until SIGTERM or SIGINT, then drain.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        service = %config.service_name,
        version = %config.version,
        address = %addr,
        startup_delay = %humantime::format_duration(config.startup_delay),
        read_timeout = %humantime::format_duration(config.read_timeout),
        write_timeout = %humantime::format_duration(config.write_timeout),
        idle_timeout = %humantime::format_duration(config.idle_timeout),
        max_body_bytes = config.max_body_bytes,
        "Starting"
    );

    serve(&config, listener, signals::wait_for_termination()).await
}

/// Serve on `listener` until `signal` resolves, then drain for at most
/// `config.shutdown_wait`.
///
/// If the server stops on its own first, its result is returned as is.
pub async fn serve<F>(
    config: &ServiceConfig,
    listener: TcpListener,
    signal: F,
) -> Result<(), StartupError>
where
    F: Future<Output = io::Result<&'static str>>,
{
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        joined = &mut task => {
            joined?.map_err(StartupError::Serve)?;
            tracing::warn!("HTTP server exited without a shutdown signal");
            return Ok(());
        }
        received = signal => {
            if let Err(e) = received {
                task.abort();
                return Err(StartupError::Signal(e));
            }
        }
    }

    let wait = config.shutdown_wait;
    tracing::info!(wait = %humantime::format_duration(wait), "Shutting down");
    shutdown.trigger();

    match tokio::time::timeout(wait, &mut task).await {
        Ok(joined) => {
            joined?.map_err(StartupError::Serve)?;
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(_) => {
            task.abort();
            tracing::error!(wait = %humantime::format_duration(wait), "Shutdown deadline exceeded");
            Err(StartupError::ShutdownTimeout(wait))
        }
    }
}
