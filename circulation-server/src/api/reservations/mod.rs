//! Reservation API 模块

mod handler;

use axum::{Router, middleware, routing::{delete, get, post, put}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    // 会员自助：预约、查自己的、取消自己的
    let member_routes = Router::new()
        .route("/", post(handler::place))
        .route("/my", get(handler::my_reservations))
        .route("/{id}", delete(handler::cancel));

    // 馆员队列管理：需要 reservations:manage 权限
    let manage_routes = Router::new()
        .route("/", get(handler::list_open))
        .route("/{id}/ready", put(handler::mark_ready))
        .route("/{id}/collect", put(handler::collect))
        .layer(middleware::from_fn(require_permission(
            "reservations:manage",
        )));

    member_routes.merge(manage_routes)
}
