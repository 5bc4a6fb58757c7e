//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs, --config / PROBE_CONFIG)
//!     → environment overrides (loader.rs, PORT, STARTUP_DELAY, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; gates keep the delay they were built with
//! - All fields have defaults to allow running with no config at all
//! - Validation separates syntactic (serde, env parsing) from semantic checks
//! - Any error is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{LogFormat, LogLevel, ObservabilityConfig, ServiceConfig};
