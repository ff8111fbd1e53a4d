//! Member API 模块

mod handler;

use axum::{Router, middleware, routing::{get, post, put}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/members", routes())
}

fn routes() -> Router<ServerState> {
    // 会员自助：注册自己、查自己
    let self_routes = Router::new()
        .route("/register", post(handler::register))
        .route("/me", get(handler::me));

    // 管理路由：需要 members:manage 权限
    let manage_routes = Router::new()
        .route("/", get(handler::list))
        .route("/search", get(handler::search))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/suspend", put(handler::suspend))
        .route("/{id}/reactivate", put(handler::reactivate))
        .layer(middleware::from_fn(require_permission("members:manage")));

    self_routes.merge(manage_routes)
}
