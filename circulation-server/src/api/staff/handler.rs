//! Staff API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use serde::Serialize;

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Staff, StaffCreate};
use crate::db::repository::StaffRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// 对外视图 — 不含密码哈希
#[derive(Serialize)]
pub struct StaffView {
    pub id: Option<String>,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub is_system: bool,
    pub is_active: bool,
}

impl From<Staff> for StaffView {
    fn from(s: Staff) -> Self {
        Self {
            id: s.id.map(|id| id.to_string()),
            username: s.username,
            display_name: s.display_name,
            role: s.role,
            is_system: s.is_system,
            is_active: s.is_active,
        }
    }
}

/// GET /api/staff - 馆员账户列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<StaffView>>> {
    let staff = StaffRepository::new(state.get_db()).find_all().await?;
    Ok(Json(staff.into_iter().map(StaffView::from).collect()))
}

/// POST /api/staff - 创建馆员账户
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<StaffCreate>,
) -> AppResult<Json<StaffView>> {
    validate_required_text(&payload.username, "username", MAX_NAME_LEN)?;
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;
    if payload.password.len() < 8 {
        return Err(AppError::validation("password must be at least 8 characters"));
    }
    if payload.role != "admin" && payload.role != "librarian" {
        return Err(AppError::validation("role must be admin or librarian"));
    }

    let staff = StaffRepository::new(state.get_db()).create(payload).await?;

    state
        .audit
        .log(
            AuditAction::StaffCreated,
            "staff",
            staff.username.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "role": staff.role }),
        )
        .await;

    Ok(Json(StaffView::from(staff)))
}
