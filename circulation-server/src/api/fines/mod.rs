//! Fine API 模块

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/fines", routes())
}

fn routes() -> Router<ServerState> {
    // 会员自助：查自己的罚款
    let member_routes = Router::new().route("/my", get(handler::my_fines));

    // 收银/减免：需要 fines:manage 权限
    let manage_routes = Router::new()
        .route("/", get(handler::list))
        .route("/member/{id}", get(handler::member_fines))
        .route("/{id}/pay", post(handler::pay))
        .route("/{id}/waive", post(handler::waive))
        .layer(middleware::from_fn(require_permission("fines:manage")));

    member_routes.merge(manage_routes)
}
