//! Renew action (续借)
//!
//! 续借上限与待取预约的拦截都在事务内复查；到期日在原 due_date 上
//! 顺延，不从续借当天起算。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{check_transaction, map_db_error};
use crate::auth::CurrentUser;
use crate::db::models::Loan;
use crate::db::repository::{LoanRepository, SettingsRepository};
use crate::utils::{AppError, AppResult, time};

const RENEW_SQL: &str = "\
BEGIN TRANSACTION; \
LET $loans = (SELECT * FROM $loan_rid); \
IF array::len($loans) == 0 { THROW 'renew:loan_not_found' }; \
LET $l = $loans[0]; \
IF $l.status != 'active' { THROW 'renew:loan_not_found' }; \
IF $l.due_date != $due_date { THROW 'renew:loan_changed' }; \
IF $l.renewal_count >= $l.max_renewals { THROW 'renew:limit_reached' }; \
LET $holds = (SELECT id FROM book_reservation \
    WHERE book = $book_ref AND status = 'pending'); \
IF array::len($holds) > 0 { THROW 'renew:pending_holds' }; \
UPDATE $loan_rid SET due_date = $new_due, renewal_count += 1, updated_at = $now; \
COMMIT TRANSACTION;";

/// Extend an active loan by one loan period.
pub async fn renew(db: &Surreal<Db>, loan_term: &str, operator: &CurrentUser) -> AppResult<Loan> {
    let settings = SettingsRepository::new(db.clone()).get().await?;
    let loan_repo = LoanRepository::new(db.clone());

    let loan = loan_repo
        .find_active_by_term(loan_term)
        .await?
        .ok_or_else(|| AppError::not_found("No active loan found"))?;
    let loan_rid = loan
        .id
        .clone()
        .ok_or_else(|| AppError::internal("loan record without id"))?;

    let now = shared::util::now_millis();
    let new_due = time::due_date_millis(loan.due_date, settings.loan_period_days.max(1) as u32);

    let mut response = db
        .query(RENEW_SQL)
        .bind(("loan_rid", loan_rid))
        .bind(("book_ref", loan.book.to_string()))
        .bind(("due_date", loan.due_date))
        .bind(("new_due", new_due))
        .bind(("now", now))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        loan_no = %loan.loan_no,
        new_due,
        operator = %operator.display_name,
        "Loan renewed"
    );

    loan_repo
        .find_by_loan_no(&loan.loan_no)
        .await?
        .ok_or_else(|| AppError::internal("loan missing after renewal"))
}
