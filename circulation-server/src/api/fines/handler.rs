//! Fine API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::circulation;
use crate::core::ServerState;
use crate::db::models::{Fine, FinePayment, FineStatus, FineWaive};
use crate::db::repository::{FineRepository, MemberRepository};
use crate::utils::{AppError, AppResult};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub status: Option<FineStatus>,
}

/// GET /api/fines - 罚款列表 (可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Fine>>> {
    let fines = FineRepository::new(state.get_db())
        .find_all(query.status)
        .await?;
    Ok(Json(fines))
}

/// GET /api/fines/my - 会员自己的罚款
pub async fn my_fines(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Fine>>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No membership for this account"))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let fines = FineRepository::new(state.get_db())
        .find_by_member(&member_id)
        .await?;
    Ok(Json(fines))
}

/// GET /api/fines/member/:id - 指定会员的罚款
pub async fn member_fines(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Fine>>> {
    let member = MemberRepository::new(state.get_db())
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let fines = FineRepository::new(state.get_db())
        .find_by_member(&member_id)
        .await?;
    Ok(Json(fines))
}

/// POST /api/fines/:id/pay - 缴款
pub async fn pay(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<FinePayment>,
) -> AppResult<Json<Fine>> {
    let fine = circulation::pay_fine(&state.db, &id, &payload, &user).await?;

    state
        .audit
        .log(
            AuditAction::FinePaid,
            "fine",
            fine.loan_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": fine.member_no,
                "amount": payload.amount,
                "status": fine.status,
            }),
        )
        .await;

    Ok(Json(fine))
}

/// POST /api/fines/:id/waive - 减免
pub async fn waive(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<FineWaive>,
) -> AppResult<Json<Fine>> {
    let fine = circulation::waive_fine(&state.db, &id, &payload, &user).await?;

    state
        .audit
        .log(
            AuditAction::FineWaived,
            "fine",
            fine.loan_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": fine.member_no,
                "reason": payload.reason,
            }),
        )
        .await;

    Ok(Json(fine))
}
