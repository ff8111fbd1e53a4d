//! Circulation API 模块 (流通台)

mod handler;

use axum::{Router, middleware, routing::{get, post}};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/circulation", routes())
}

fn routes() -> Router<ServerState> {
    // 会员自助
    let member_routes = Router::new()
        .route("/my-loans", get(handler::my_loans))
        .route("/my-history", get(handler::my_history))
        .route("/renew/{loan}", post(handler::renew));

    // 流通台操作：需要 circulation:desk 权限
    let desk_routes = Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/checkin", post(handler::checkin))
        .route("/active-loans", get(handler::active_loans))
        .route("/overdue", get(handler::overdue))
        .route("/history/member/{id}", get(handler::member_history))
        .route("/history/book/{book_id}", get(handler::book_history))
        .layer(middleware::from_fn(require_permission("circulation:desk")));

    member_routes.merge(desk_routes)
}
