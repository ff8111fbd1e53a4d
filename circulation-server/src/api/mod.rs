//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录、当前用户
//! - [`members`] - 会员注册与档案
//! - [`inventory`] - 馆藏管理与可借查询
//! - [`circulation`] - 借出/归还/续借与台账查询
//! - [`reservations`] - 预约全生命周期
//! - [`fines`] - 罚款查询/缴纳/减免
//! - [`settings`] - 借阅策略
//! - [`reports`] - 流通报表
//! - [`audit_log`] - 审计台账查询与链验证
//! - [`staff`] - 馆员账户管理 (仅 admin)
//! - [`upload`] - 会员照片上传

pub mod audit_log;
pub mod auth;
pub mod circulation;
pub mod fines;
pub mod health;
pub mod inventory;
pub mod members;
pub mod reports;
pub mod reservations;
pub mod settings;
pub mod staff;
pub mod upload;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// 整机请求超时
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// 组装全部 API 路由与中间件
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(members::router())
        .merge(inventory::router())
        .merge(circulation::router())
        .merge(reservations::router())
        .merge(fines::router())
        .merge(settings::router())
        .merge(reports::router())
        .merge(audit_log::router())
        .merge(staff::router())
        .merge(upload::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
