//! Upload API 模块 (会员照片)

mod handler;

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/upload/member-photo/{id}", post(handler::member_photo))
        // 照片上限 5 MB，给 multipart 外层留些余量
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
}
