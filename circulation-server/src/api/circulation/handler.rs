//! Circulation API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::circulation::{self, CheckinRequest, CheckoutRequest};
use crate::core::ServerState;
use crate::db::models::Loan;
use crate::db::repository::{LoanRepository, MemberRepository};
use crate::utils::{AppError, AppResult};

/// POST /api/circulation/checkout - 借出
pub async fn checkout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<Loan>> {
    let loan = circulation::checkout(&state.db, &payload, &user).await?;

    state
        .audit
        .log(
            AuditAction::BookCheckedOut,
            "loan",
            loan.loan_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": loan.member_no,
                "book_id": loan.book_id,
                "due_date": loan.due_date,
                "note": format!("Book checked out to {}", loan.member_name),
            }),
        )
        .await;

    Ok(Json(loan))
}

/// POST /api/circulation/checkin - 归还
pub async fn checkin(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CheckinRequest>,
) -> AppResult<Json<Loan>> {
    let loan = circulation::checkin(&state.db, &payload, &user).await?;

    state
        .audit
        .log(
            AuditAction::BookReturned,
            "loan",
            loan.loan_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": loan.member_no,
                "book_id": loan.book_id,
                "days_overdue": loan.days_overdue,
                "fine_amount": loan.fine_amount,
                "book_condition": loan.book_condition,
            }),
        )
        .await;

    Ok(Json(loan))
}

/// POST /api/circulation/renew/:loan - 续借
///
/// 馆员可续任何借阅；会员只能续自己的。
pub async fn renew(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(loan_term): Path<String>,
) -> AppResult<Json<Loan>> {
    if !user.has_permission("circulation:desk") {
        let member = MemberRepository::new(state.get_db())
            .find_by_uid(&user.id)
            .await?
            .ok_or_else(|| AppError::forbidden("No membership for this account"))?;
        let loan = LoanRepository::new(state.get_db())
            .find_active_by_term(&loan_term)
            .await?
            .ok_or_else(|| AppError::not_found("No active loan found"))?;
        let owns = member
            .id
            .as_ref()
            .map(|id| id.to_string() == loan.member.to_string())
            .unwrap_or(false);
        if !owns {
            return Err(AppError::forbidden("Loan belongs to another member"));
        }
    }

    let loan = circulation::renew(&state.db, &loan_term, &user).await?;

    state
        .audit
        .log(
            AuditAction::LoanRenewed,
            "loan",
            loan.loan_no.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({
                "member_no": loan.member_no,
                "renewal_count": loan.renewal_count,
                "due_date": loan.due_date,
            }),
        )
        .await;

    Ok(Json(loan))
}

/// GET /api/circulation/my-loans - 会员当前借阅
pub async fn my_loans(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Loan>>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No membership for this account"))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let loans = LoanRepository::new(state.get_db())
        .find_active_by_member(&member_id)
        .await?;
    Ok(Json(loans))
}

/// GET /api/circulation/my-history - 会员借阅历史
pub async fn my_history(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Loan>>> {
    let member = MemberRepository::new(state.get_db())
        .find_by_uid(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No membership for this account"))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let loans = LoanRepository::new(state.get_db())
        .history_by_member(&member_id)
        .await?;
    Ok(Json(loans))
}

/// GET /api/circulation/active-loans - 全部在借
pub async fn active_loans(State(state): State<ServerState>) -> AppResult<Json<Vec<Loan>>> {
    let loans = LoanRepository::new(state.get_db()).find_active().await?;
    Ok(Json(loans))
}

/// GET /api/circulation/overdue - 逾期在借
pub async fn overdue(State(state): State<ServerState>) -> AppResult<Json<Vec<Loan>>> {
    let loans = LoanRepository::new(state.get_db())
        .find_overdue(shared::util::now_millis())
        .await?;
    Ok(Json(loans))
}

/// GET /api/circulation/history/member/:id - 会员借阅历史 (馆员)
pub async fn member_history(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Loan>>> {
    let member = MemberRepository::new(state.get_db())
        .resolve(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    let member_id = member
        .id
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let loans = LoanRepository::new(state.get_db())
        .history_by_member(&member_id)
        .await?;
    Ok(Json(loans))
}

/// GET /api/circulation/history/book/:book_id - 书目流通历史 (馆员)
pub async fn book_history(
    State(state): State<ServerState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = LoanRepository::new(state.get_db())
        .history_by_book(&book_id)
        .await?;
    Ok(Json(loans))
}
