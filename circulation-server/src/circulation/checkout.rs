//! Checkout action (借出)
//!
//! 全部前置条件与计数器变更在同一个事务里：任何一条不满足即 THROW
//! 回滚。并发借出最后一册时只有一个事务能通过 `available_copies > 0`。

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{check_transaction, map_db_error};
use crate::auth::CurrentUser;
use crate::db::models::{Loan, LoanStatus};
use crate::db::repository::{InventoryRepository, LoanRepository, MemberRepository, SettingsRepository};
use crate::utils::{AppError, AppResult, time};

/// Desk checkout request: member by card number or record id,
/// book by book_id or call number.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub member: String,
    pub book: String,
}

const CHECKOUT_SQL: &str = "\
BEGIN TRANSACTION; \
LET $members = (SELECT * FROM $member_rid); \
IF array::len($members) == 0 { THROW 'checkout:member_not_found' }; \
LET $m = $members[0]; \
IF $m.status != 'active' { THROW 'checkout:member_not_active' }; \
IF $m.membership_expiry < $now { THROW 'checkout:membership_expired' }; \
IF $m.current_books_borrowed >= $m.max_books_allowed { THROW 'checkout:limit_reached' }; \
IF $m.fine_balance > 0 { THROW 'checkout:outstanding_fines' }; \
LET $books = (SELECT * FROM $book_rid); \
IF array::len($books) == 0 { THROW 'checkout:book_not_found' }; \
IF $books[0].available_copies <= 0 { THROW 'checkout:no_copies' }; \
UPDATE $member_rid SET current_books_borrowed += 1, \
    total_books_borrowed_lifetime += 1, updated_at = $now; \
UPDATE $book_rid SET available_copies -= 1, total_checkouts += 1, updated_at = $now; \
CREATE book_loan CONTENT $loan; \
COMMIT TRANSACTION;";

/// Check a book out to a member. Returns the created loan.
pub async fn checkout(
    db: &Surreal<Db>,
    req: &CheckoutRequest,
    operator: &CurrentUser,
) -> AppResult<Loan> {
    let settings = SettingsRepository::new(db.clone()).get().await?;

    let member = MemberRepository::new(db.clone())
        .resolve(&req.member)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", req.member)))?;
    let book = InventoryRepository::new(db.clone())
        .resolve(&req.book)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {}", req.book)))?;

    let member_rid = member
        .id
        .clone()
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let book_rid = book
        .id
        .clone()
        .ok_or_else(|| AppError::internal("inventory record without id"))?;

    let now = shared::util::now_millis();
    let loan = Loan {
        id: None,
        loan_no: shared::util::loan_reference(),
        member: member_rid.clone(),
        member_no: member.member_no.clone(),
        member_name: member.full_name.clone(),
        book: book_rid.clone(),
        book_id: book.book_id.clone(),
        book_title: book.title.clone(),
        checkout_date: now,
        due_date: time::due_date_millis(now, settings.loan_period_days.max(1) as u32),
        status: LoanStatus::Active,
        renewal_count: 0,
        max_renewals: settings.max_renewals,
        days_overdue: 0,
        fine_amount: 0.0,
        book_condition: None,
        damage_notes: None,
        return_date: None,
        librarian_id: Some(operator.id.clone()),
        librarian_name: Some(operator.display_name.clone()),
        returned_by: None,
        created_at: Some(now),
        updated_at: Some(now),
    };
    let loan_no = loan.loan_no.clone();

    let mut response = db
        .query(CHECKOUT_SQL)
        .bind(("member_rid", member_rid))
        .bind(("book_rid", book_rid))
        .bind(("now", now))
        .bind(("loan", loan))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        member_no = %member.member_no,
        book_id = %book.book_id,
        loan_no = %loan_no,
        "Book checked out"
    );

    LoanRepository::new(db.clone())
        .find_by_loan_no(&loan_no)
        .await?
        .ok_or_else(|| AppError::internal("loan missing after checkout"))
}
