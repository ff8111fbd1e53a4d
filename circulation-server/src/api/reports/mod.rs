//! Reports API 模块 (流通报表)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/overdue", get(handler::overdue_detail))
        .layer(middleware::from_fn(require_permission("reports:view")))
}
