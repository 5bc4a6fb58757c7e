//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use probe_delay::config::ServiceConfig;
use probe_delay::http::{AppState, HttpServer};
use probe_delay::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A service instance listening on an ephemeral local port.
pub struct TestService {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Broadcast shutdown and wait for the server task to finish.
    #[allow(dead_code)]
    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Config with the given startup delay and test-friendly everything else.
#[allow(dead_code)]
pub fn config(startup_delay: Duration) -> ServiceConfig {
    ServiceConfig {
        startup_delay,
        service_name: "it-service".to_string(),
        version: "1.2.3".to_string(),
        shutdown_wait: Duration::from_secs(5),
        ..ServiceConfig::default()
    }
}

/// Start the full service on 127.0.0.1 with an ephemeral port.
#[allow(dead_code)]
pub async fn start_service(config: ServiceConfig) -> TestService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config);
    let state = server.state().clone();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestService {
        addr,
        state,
        shutdown,
        handle,
    }
}

/// Serve an arbitrary router the way the service does, with peer addresses
/// available to the access log.
#[allow(dead_code)]
pub async fn serve_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, app).await;
    });

    addr
}
