//! Fine settlement actions (缴款/减免)
//!
//! 罚款单与会员 `fine_balance` 在同一事务内同步变化，余额清零后
//! 借出/预约的资格检查自然放行。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{check_transaction, fine_math, map_db_error};
use crate::auth::CurrentUser;
use crate::db::models::{Fine, FinePayment, FineWaive};
use crate::db::repository::FineRepository;
use crate::utils::{AppError, AppResult, validation};

const PAY_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $fine_rid); \
IF array::len($rows) == 0 { THROW 'fine:not_found' }; \
LET $f = $rows[0]; \
IF $f.status = 'paid' OR $f.status = 'waived' { THROW 'fine:already_settled' }; \
IF $f.amount_paid != $expected_paid { THROW 'fine:already_settled' }; \
LET $new_paid = $f.amount_paid + $amount; \
IF $new_paid > $f.amount { THROW 'fine:overpayment' }; \
LET $new_status = (IF $new_paid >= $f.amount { 'paid' } ELSE { 'partial' }); \
UPDATE $fine_rid SET amount_paid = $new_paid, status = $new_status, \
    payment_method = $method, payment_reference = $reference, \
    payment_date = $now, updated_at = $now; \
UPDATE $member_rid SET fine_balance -= $amount, updated_at = $now; \
COMMIT TRANSACTION;";

/// Record a (possibly partial) payment against a fine.
pub async fn pay_fine(
    db: &Surreal<Db>,
    fine_id: &str,
    payment: &FinePayment,
    operator: &CurrentUser,
) -> AppResult<Fine> {
    if payment.amount <= 0.0 {
        return Err(AppError::validation("Payment amount must be positive"));
    }

    let repo = FineRepository::new(db.clone());
    let fine = repo
        .find_by_id(fine_id)
        .await?
        .ok_or_else(|| AppError::not_found("Fine not found"))?;
    let fine_rid = fine
        .id
        .clone()
        .ok_or_else(|| AppError::internal("fine record without id"))?;

    // Round to cents before it reaches the ledger
    let amount = fine_math::to_f64(fine_math::to_decimal(payment.amount));

    let mut response = db
        .query(PAY_SQL)
        .bind(("fine_rid", fine_rid))
        .bind(("member_rid", fine.member.clone()))
        .bind(("expected_paid", fine.amount_paid))
        .bind(("amount", amount))
        .bind(("method", payment.payment_method.clone()))
        .bind(("reference", payment.payment_reference.clone()))
        .bind(("now", shared::util::now_millis()))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        member_no = %fine.member_no,
        amount,
        operator = %operator.display_name,
        "Fine payment recorded"
    );

    repo.find_by_id(fine_id)
        .await?
        .ok_or_else(|| AppError::internal("fine missing after payment"))
}

const WAIVE_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $fine_rid); \
IF array::len($rows) == 0 { THROW 'fine:not_found' }; \
LET $f = $rows[0]; \
IF $f.status = 'paid' OR $f.status = 'waived' { THROW 'fine:already_settled' }; \
LET $remaining = $f.amount - $f.amount_paid; \
UPDATE $fine_rid SET status = 'waived', waived_by = $waived_by, \
    waive_reason = $reason, updated_at = $now; \
UPDATE $member_rid SET fine_balance -= $remaining, updated_at = $now; \
COMMIT TRANSACTION;";

/// Waive the outstanding remainder of a fine.
pub async fn waive_fine(
    db: &Surreal<Db>,
    fine_id: &str,
    waive: &FineWaive,
    operator: &CurrentUser,
) -> AppResult<Fine> {
    validation::validate_required_text(&waive.reason, "reason", validation::MAX_NOTE_LEN)?;

    let repo = FineRepository::new(db.clone());
    let fine = repo
        .find_by_id(fine_id)
        .await?
        .ok_or_else(|| AppError::not_found("Fine not found"))?;
    let fine_rid = fine
        .id
        .clone()
        .ok_or_else(|| AppError::internal("fine record without id"))?;

    let mut response = db
        .query(WAIVE_SQL)
        .bind(("fine_rid", fine_rid))
        .bind(("member_rid", fine.member.clone()))
        .bind(("waived_by", operator.display_name.clone()))
        .bind(("reason", waive.reason.clone()))
        .bind(("now", shared::util::now_millis()))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        member_no = %fine.member_no,
        operator = %operator.display_name,
        "Fine waived"
    );

    repo.find_by_id(fine_id)
        .await?
        .ok_or_else(|| AppError::internal("fine missing after waive"))
}
