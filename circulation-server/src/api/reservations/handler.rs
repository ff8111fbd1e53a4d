//! Reservation API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::circulation::{self, reserve::ReserveRequest};
use crate::core::ServerState;
use crate::db::models::Reservation;
use crate::db::repository::{MemberRepository, ReservationRepository};
use crate::utils::{AppError, AppResult};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// POST /api/reservations - 会员预约一个书目
pub async fn place(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ReserveRequest>,
) -> AppResult<Json<Reservation>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| {
            AppError::business_rule("You need to register for library membership first")
        })?;

    let reservation = circulation::reserve(&state.db, &member, &payload.book).await?;

    state
        .audit
        .log(
            AuditAction::ReservationPlaced,
            "reservation",
            reservation.reservation_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": reservation.member_no,
                "book_id": reservation.book_id,
                "expires_at": reservation.expires_at,
                "note": format!(
                    "Member {} reserved {}",
                    reservation.member_name, reservation.book_title
                ),
            }),
        )
        .await;

    Ok(Json(reservation))
}

/// GET /api/reservations/my - 会员自己的预约
pub async fn my_reservations(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Reservation>>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No membership for this account"))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let reservations = ReservationRepository::new(state.get_db())
        .find_by_member(&member_id)
        .await?;
    Ok(Json(reservations))
}

/// GET /api/reservations - 待处理队列 (pending + ready)
pub async fn list_open(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = ReservationRepository::new(state.get_db())
        .find_open(query.limit.min(200))
        .await?;
    Ok(Json(reservations))
}

/// DELETE /api/reservations/:id - 取消预约 (本人或馆员)
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let repo = ReservationRepository::new(state.get_db());
    let reservation = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;

    if !user.has_permission("reservations:manage") {
        let member = MemberRepository::new(state.get_db())
            .find_by_uid(&user.id)
            .await?
            .ok_or_else(|| AppError::forbidden("No membership for this account"))?;
        let owns = member
            .id
            .as_ref()
            .map(|m| m.to_string() == reservation.member.to_string())
            .unwrap_or(false);
        if !owns {
            return Err(AppError::forbidden("Reservation belongs to another member"));
        }
    }

    let reservation = circulation::cancel_reservation(&state.db, &id).await?;

    state
        .audit
        .log(
            AuditAction::ReservationCancelled,
            "reservation",
            reservation.reservation_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "member_no": reservation.member_no }),
        )
        .await;

    Ok(Json(reservation))
}

/// PUT /api/reservations/:id/ready - 到书，通知取书
pub async fn mark_ready(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = circulation::mark_reservation_ready(&state.db, &id).await?;

    state
        .audit
        .log(
            AuditAction::ReservationReady,
            "reservation",
            reservation.reservation_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "member_no": reservation.member_no }),
        )
        .await;

    Ok(Json(reservation))
}

/// PUT /api/reservations/:id/collect - 取书完成
pub async fn collect(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Reservation>> {
    let reservation = circulation::collect_reservation(&state.db, &id).await?;

    state
        .audit
        .log(
            AuditAction::ReservationCollected,
            "reservation",
            reservation.reservation_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "member_no": reservation.member_no }),
        )
        .await;

    Ok(Json(reservation))
}
