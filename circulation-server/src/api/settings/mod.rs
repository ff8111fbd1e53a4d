//! Settings API 模块 (借阅策略)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    // 借阅策略是公开信息，登录即可读取；修改需要 settings:manage
    Router::new()
        .route("/", get(handler::get_settings))
        .merge(
            Router::new()
                .route("/", axum::routing::put(handler::update_settings))
                .layer(middleware::from_fn(require_permission("settings:manage"))),
        )
}
