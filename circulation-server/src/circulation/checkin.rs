//! Check-in action (归还)
//!
//! 罚款在事务外用 Decimal 算好，事务内校验 loan 未被并发改动
//! (status + due_date) 后一次性落库。`lost` 归还不恢复
//! `available_copies` —— 该册默认永久流失，`total_copies` 的核销
//! 留给人工处理 (见 reports 的 unreconciled_lost_copies)。

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{check_transaction, fine_math, map_db_error};
use crate::auth::CurrentUser;
use crate::db::models::{
    BookCondition, Fine, FineStatus, FineType, Loan,
};
use crate::db::repository::{LoanRepository, SettingsRepository};
use crate::utils::{AppError, AppResult, time, validation};

/// Desk return request: loan by loan reference or book id.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinRequest {
    pub loan: String,
    #[serde(default = "default_condition")]
    pub book_condition: BookCondition,
    pub damage_notes: Option<String>,
}

fn default_condition() -> BookCondition {
    BookCondition::Good
}

const CHECKIN_SQL: &str = "\
BEGIN TRANSACTION; \
LET $loans = (SELECT * FROM $loan_rid); \
IF array::len($loans) == 0 { THROW 'checkin:loan_not_found' }; \
LET $l = $loans[0]; \
IF $l.status != 'active' { THROW 'checkin:loan_not_active' }; \
IF $l.due_date != $due_date { THROW 'checkin:loan_changed' }; \
UPDATE $loan_rid SET status = 'returned', return_date = $now, \
    days_overdue = $days_overdue, fine_amount = $fine_amount, \
    book_condition = $condition, damage_notes = $damage_notes, \
    returned_by = $operator_id, updated_at = $now; \
UPDATE $member_rid SET current_books_borrowed -= 1, \
    fine_balance += $fine_amount, overdue_count += $overdue_inc, \
    updated_at = $now; \
IF $condition != 'lost' { \
    UPDATE $book_rid SET available_copies += 1, updated_at = $now; \
}; \
IF $fine_amount > 0 { CREATE library_fine CONTENT $fine; }; \
COMMIT TRANSACTION;";

/// Close an active loan, assess fines, restore inventory.
pub async fn checkin(
    db: &Surreal<Db>,
    req: &CheckinRequest,
    operator: &CurrentUser,
) -> AppResult<Loan> {
    validation::validate_optional_text(&req.damage_notes, "damage_notes", validation::MAX_NOTE_LEN)?;

    let settings = SettingsRepository::new(db.clone()).get().await?;
    let loan_repo = LoanRepository::new(db.clone());

    let loan = loan_repo
        .find_active_by_term(&req.loan)
        .await?
        .ok_or_else(|| AppError::not_found("No active loan found"))?;
    let loan_rid = loan
        .id
        .clone()
        .ok_or_else(|| AppError::internal("loan record without id"))?;

    let now = shared::util::now_millis();
    let days_overdue = time::days_overdue(loan.due_date, now);
    let fine_amount = fine_math::compute_fine(days_overdue, req.book_condition, &settings);

    let fine = Fine {
        id: None,
        member: loan.member.clone(),
        member_no: loan.member_no.clone(),
        member_name: loan.member_name.clone(),
        loan_no: loan.loan_no.clone(),
        book_id: loan.book_id.clone(),
        book_title: loan.book_title.clone(),
        // 逾期优先于书况分类 (金额仍然叠加)
        fine_type: if days_overdue > 0 {
            FineType::Overdue
        } else {
            match req.book_condition {
                BookCondition::Damaged => FineType::Damaged,
                BookCondition::Lost => FineType::Lost,
                BookCondition::Good => FineType::Overdue,
            }
        },
        amount: fine_amount,
        amount_paid: 0.0,
        days_overdue: days_overdue as i64,
        status: FineStatus::Unpaid,
        payment_method: None,
        payment_reference: None,
        payment_date: None,
        waived_by: None,
        waive_reason: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let mut response = db
        .query(CHECKIN_SQL)
        .bind(("loan_rid", loan_rid.clone()))
        .bind(("member_rid", loan.member.clone()))
        .bind(("book_rid", loan.book.clone()))
        .bind(("due_date", loan.due_date))
        .bind(("now", now))
        .bind(("days_overdue", days_overdue as i64))
        .bind(("fine_amount", fine_amount))
        .bind(("condition", req.book_condition))
        .bind(("damage_notes", req.damage_notes.clone()))
        .bind(("overdue_inc", if days_overdue > 0 { 1_i64 } else { 0 }))
        .bind(("operator_id", operator.id.clone()))
        .bind(("fine", fine))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        loan_no = %loan.loan_no,
        days_overdue,
        fine_amount,
        condition = ?req.book_condition,
        "Book returned"
    );

    loan_repo
        .find_by_loan_no(&loan.loan_no)
        .await?
        .ok_or_else(|| AppError::internal("loan missing after return"))
}
