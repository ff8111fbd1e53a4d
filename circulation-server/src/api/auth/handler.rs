//! Auth API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use serde::Serialize;

use crate::audit::AuditAction;
use crate::auth::{CurrentUser, get_default_permissions};
use crate::core::ServerState;
use crate::db::models::LoginRequest;
use crate::db::repository::StaffRepository;
use crate::security_log;
use crate::utils::{AppError, AppResult};

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// POST /api/auth/login - 馆员登录
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let repo = StaffRepository::new(state.get_db());

    let staff = repo.find_by_username(&payload.username).await?;

    // 统一失败路径，避免暴露用户名是否存在
    let Some(staff) = staff.filter(|s| s.is_active && s.verify_password(&payload.password)) else {
        security_log!("WARN", "login_failed", username = payload.username.clone());
        state
            .audit
            .log(
                AuditAction::LoginFailed,
                "staff",
                payload.username.clone(),
                None,
                None,
                serde_json::json!({}),
            )
            .await;
        return Err(AppError::invalid_credentials());
    };

    let staff_id = staff
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let permissions = get_default_permissions(&staff.role);

    let token = state
        .jwt_service
        .generate_token(
            &staff_id,
            &staff.username,
            &staff.display_name,
            &staff.role,
            &permissions,
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    state
        .audit
        .log(
            AuditAction::LoginSuccess,
            "staff",
            staff_id.clone(),
            Some(staff_id),
            Some(staff.display_name.clone()),
            serde_json::json!({}),
        )
        .await;

    Ok(Json(LoginResponse {
        token,
        username: staff.username,
        display_name: staff.display_name,
        role: staff.role,
        permissions,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// GET /api/auth/me - 当前用户
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        permissions: user.permissions,
    })
}
