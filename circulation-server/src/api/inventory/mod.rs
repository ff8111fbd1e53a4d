//! Inventory API 模块

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由：登录即可 (目录查询)
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/search", get(handler::search))
        .route("/availability/{book_id}", get(handler::availability))
        .route("/{id}", get(handler::get_by_id));

    // 管理路由：需要 inventory:manage 权限
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", axum::routing::put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_permission("inventory:manage")));

    read_routes.merge(manage_routes)
}
