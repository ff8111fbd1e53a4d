//! Reports API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::Loan;
use crate::db::repository::{FineRepository, LoanRepository, ReservationRepository};
use crate::utils::{AppResult, time};

/// 流通台账总览
#[derive(Serialize)]
pub struct DashboardStats {
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub open_reservations: u64,
    /// 未结清罚款总额 (LKR)
    pub outstanding_fines: f64,
    /// 已判定遗失但 `total_copies` 尚未核销的册数。
    /// 遗失归还从不回补 `available_copies`，这里暴露缺口供人工核销。
    pub unreconciled_lost_copies: u64,
}

/// GET /api/reports/dashboard - 流通总览
pub async fn dashboard(State(state): State<ServerState>) -> AppResult<Json<DashboardStats>> {
    let loan_repo = LoanRepository::new(state.get_db());
    let now = shared::util::now_millis();

    let active = loan_repo.find_active().await?;
    let overdue_count = active.iter().filter(|l| l.due_date < now).count();
    let open_reservations = ReservationRepository::new(state.get_db())
        .count_open()
        .await?;
    let outstanding = FineRepository::new(state.get_db()).outstanding_total().await?;
    let lost = loan_repo.count_lost_returns().await?;

    Ok(Json(DashboardStats {
        active_loans: active.len(),
        overdue_loans: overdue_count,
        open_reservations,
        outstanding_fines: outstanding,
        unreconciled_lost_copies: lost,
    }))
}

/// 逾期明细行
#[derive(Serialize)]
pub struct OverdueRow {
    #[serde(flatten)]
    pub loan: Loan,
    pub days_overdue_now: u32,
}

/// GET /api/reports/overdue - 逾期明细
pub async fn overdue_detail(State(state): State<ServerState>) -> AppResult<Json<Vec<OverdueRow>>> {
    let now = shared::util::now_millis();
    let loans = LoanRepository::new(state.get_db()).find_overdue(now).await?;

    let rows = loans
        .into_iter()
        .map(|loan| {
            let days = time::days_overdue(loan.due_date, now);
            OverdueRow {
                loan,
                days_overdue_now: days,
            }
        })
        .collect();

    Ok(Json(rows))
}
