//! Reservation actions (预约/取消/到书/取书)
//!
//! 与借出同理：资格校验、重复预约检查和 `total_reservations` 计数
//! 变更在同一事务内完成。

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{check_transaction, map_db_error};
use crate::db::models::{Member, Reservation, ReservationStatus};
use crate::db::repository::{InventoryRepository, ReservationRepository, SettingsRepository};
use crate::utils::{AppError, AppResult, time};

/// Member-facing reservation request (book by book_id or call number)
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveRequest {
    pub book: String,
}

const RESERVE_SQL: &str = "\
BEGIN TRANSACTION; \
LET $members = (SELECT * FROM $member_rid); \
IF array::len($members) == 0 { THROW 'reserve:member_not_found' }; \
LET $m = $members[0]; \
IF $m.status != 'active' { THROW 'reserve:member_not_active' }; \
IF $m.membership_expiry < $now { THROW 'reserve:membership_expired' }; \
IF $m.current_books_borrowed >= $m.max_books_allowed { THROW 'reserve:limit_reached' }; \
IF $m.fine_balance > 0 { THROW 'reserve:outstanding_fines' }; \
LET $books = (SELECT * FROM $book_rid); \
IF array::len($books) == 0 { THROW 'reserve:book_not_found' }; \
LET $existing = (SELECT id FROM book_reservation \
    WHERE member = $member_ref AND book = $book_ref \
    AND status IN ['pending', 'ready']); \
IF array::len($existing) > 0 { THROW 'reserve:duplicate' }; \
UPDATE $book_rid SET total_reservations += 1, updated_at = $now; \
CREATE book_reservation CONTENT $reservation; \
COMMIT TRANSACTION;";

/// Place a hold on a title for a member.
pub async fn reserve(db: &Surreal<Db>, member: &Member, book_term: &str) -> AppResult<Reservation> {
    let settings = SettingsRepository::new(db.clone()).get().await?;

    let book = InventoryRepository::new(db.clone())
        .resolve(book_term)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {}", book_term)))?;

    let member_rid = member
        .id
        .clone()
        .ok_or_else(|| AppError::internal("member record without id"))?;
    let book_rid = book
        .id
        .clone()
        .ok_or_else(|| AppError::internal("inventory record without id"))?;

    let now = shared::util::now_millis();
    let reservation = Reservation {
        id: None,
        reservation_no: shared::util::reservation_reference(),
        member: member_rid.clone(),
        member_no: member.member_no.clone(),
        member_name: member.full_name.clone(),
        member_email: Some(member.email.clone()),
        member_phone: member.phone.clone(),
        book: book_rid.clone(),
        book_id: book.book_id.clone(),
        book_title: book.title.clone(),
        status: ReservationStatus::Pending,
        reserved_at: now,
        ready_at: None,
        expires_at: now + settings.reservation_expiry_days.max(1) * time::DAY_MS,
        priority: 1,
        notification_sent: false,
        cancelled_at: None,
        created_at: Some(now),
        updated_at: Some(now),
    };
    let reservation_no = reservation.reservation_no.clone();

    let mut response = db
        .query(RESERVE_SQL)
        .bind(("member_rid", member_rid.clone()))
        .bind(("book_rid", book_rid.clone()))
        .bind(("member_ref", member_rid.to_string()))
        .bind(("book_ref", book_rid.to_string()))
        .bind(("now", now))
        .bind(("reservation", reservation))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(
        member_no = %member.member_no,
        book_id = %book.book_id,
        reservation_no = %reservation_no,
        "Reservation placed"
    );

    find_by_reservation_no(db, &reservation_no).await
}

const CANCEL_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $res_rid); \
IF array::len($rows) == 0 { THROW 'reservation:not_found' }; \
LET $r = $rows[0]; \
IF $r.status != 'pending' AND $r.status != 'ready' { THROW 'reservation:not_open' }; \
UPDATE $res_rid SET status = 'cancelled', cancelled_at = $now, updated_at = $now; \
UPDATE $book_rid SET total_reservations -= 1, updated_at = $now; \
COMMIT TRANSACTION;";

/// Cancel an open reservation (owning member or librarian).
pub async fn cancel_reservation(db: &Surreal<Db>, reservation_id: &str) -> AppResult<Reservation> {
    let repo = ReservationRepository::new(db.clone());
    let reservation = repo
        .find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;
    let res_rid = reservation
        .id
        .clone()
        .ok_or_else(|| AppError::internal("reservation record without id"))?;

    let mut response = db
        .query(CANCEL_SQL)
        .bind(("res_rid", res_rid.clone()))
        .bind(("book_rid", reservation.book.clone()))
        .bind(("now", shared::util::now_millis()))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    tracing::info!(reservation_no = %reservation.reservation_no, "Reservation cancelled");

    repo.find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::internal("reservation missing after cancel"))
}

const READY_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $res_rid); \
IF array::len($rows) == 0 { THROW 'reservation:not_found' }; \
IF $rows[0].status != 'pending' { THROW 'reservation:not_pending' }; \
UPDATE $res_rid SET status = 'ready', ready_at = $now, \
    notification_sent = false, updated_at = $now; \
COMMIT TRANSACTION;";

/// Librarian marks a pending reservation as ready for pickup.
pub async fn mark_reservation_ready(
    db: &Surreal<Db>,
    reservation_id: &str,
) -> AppResult<Reservation> {
    let repo = ReservationRepository::new(db.clone());
    let reservation = repo
        .find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;
    let res_rid = reservation
        .id
        .clone()
        .ok_or_else(|| AppError::internal("reservation record without id"))?;

    let mut response = db
        .query(READY_SQL)
        .bind(("res_rid", res_rid))
        .bind(("now", shared::util::now_millis()))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    repo.find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::internal("reservation missing after update"))
}

const COLLECT_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $res_rid); \
IF array::len($rows) == 0 { THROW 'reservation:not_found' }; \
IF $rows[0].status != 'ready' { THROW 'reservation:not_ready' }; \
UPDATE $res_rid SET status = 'collected', updated_at = $now; \
UPDATE $book_rid SET total_reservations -= 1, updated_at = $now; \
COMMIT TRANSACTION;";

/// Librarian records that the member picked the book up. The checkout
/// itself is a separate desk action.
pub async fn collect_reservation(
    db: &Surreal<Db>,
    reservation_id: &str,
) -> AppResult<Reservation> {
    let repo = ReservationRepository::new(db.clone());
    let reservation = repo
        .find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation not found"))?;
    let res_rid = reservation
        .id
        .clone()
        .ok_or_else(|| AppError::internal("reservation record without id"))?;

    let mut response = db
        .query(COLLECT_SQL)
        .bind(("res_rid", res_rid))
        .bind(("book_rid", reservation.book.clone()))
        .bind(("now", shared::util::now_millis()))
        .await
        .map_err(map_db_error)?;
    check_transaction(&mut response)?;

    repo.find_by_id(reservation_id)
        .await?
        .ok_or_else(|| AppError::internal("reservation missing after update"))
}

async fn find_by_reservation_no(db: &Surreal<Db>, reservation_no: &str) -> AppResult<Reservation> {
    let reservation_no = reservation_no.to_string();
    let mut result = db
        .query("SELECT * FROM book_reservation WHERE reservation_no = $no LIMIT 1")
        .bind(("no", reservation_no))
        .await
        .map_err(map_db_error)?;
    let reservations: Vec<Reservation> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;
    reservations
        .into_iter()
        .next()
        .ok_or_else(|| AppError::internal("reservation missing after create"))
}
