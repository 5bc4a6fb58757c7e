//! Delayed health and readiness probes behind a small middleware pipeline.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use health::DelayedGate;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
