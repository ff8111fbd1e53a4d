//! Audit Log API 模块

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit-log", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::query))
        .route("/verify", get(handler::verify_chain))
        .layer(middleware::from_fn(require_permission("audit:view")))
}
