//! Liveness and readiness subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ServiceConfig.startup_delay
//!     → gate.rs (health + ready gates, pending)
//!     → timer fires after the delay → achieved
//!
//! Probe request (probes.rs):
//!     GET /healthz | /readyz
//!     → read one gate
//!     → 200 when achieved, 503 + retry_after_ms while pending
//!
//! Admin reset (crate::admin):
//!     POST /admin/.../reset
//!     → gate.reset() → pending again, window restarted
//! ```
//!
//! # Design Decisions
//! - Gates are owned by the server's `AppState`, never global
//! - Probes are read-only; only admin routes reset

pub mod gate;
pub mod probes;

pub use gate::DelayedGate;
