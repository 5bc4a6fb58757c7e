//! Operator endpoints for forcing the gates back to pending.
//!
//! # Routes
//! - `POST /admin/reset`: both gates
//! - `POST /admin/health/reset`: health gate only
//! - `POST /admin/ready/reset`: ready gate only
//!
//! There is no authentication; expose the port only where operators can
//! reach it.

pub mod handlers;

use axum::routing::any;
use axum::Router;

use self::handlers::{reset_all, reset_health, reset_ready};
use crate::http::server::AppState;

/// Admin routes, merged into the main router before state is attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/reset", any(reset_all))
        .route("/admin/health/reset", any(reset_health))
        .route("/admin/ready/reset", any(reset_ready))
}
