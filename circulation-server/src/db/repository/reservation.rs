//! Reservation Repository
//!
//! 只读查询。预约状态迁移见 `circulation::reserve`。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Reservation;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct ReservationRepository {
    base: BaseRepository,
}

impl ReservationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Reservation>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let reservation: Option<Reservation> = self.base.db().select(thing).await?;
        Ok(reservation)
    }

    /// Pending + ready reservations for the desk queue, newest first
    pub async fn find_open(&self, limit: usize) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT * FROM book_reservation WHERE status IN ['pending', 'ready'] \
             ORDER BY reserved_at DESC LIMIT {}",
            limit
        );
        let reservations: Vec<Reservation> = self.base.db().query(&sql).await?.take(0)?;
        Ok(reservations)
    }

    pub async fn find_by_member(&self, member: &RecordId) -> RepoResult<Vec<Reservation>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM book_reservation WHERE member = $member \
                 ORDER BY reserved_at DESC",
            )
            .bind(("member", member.to_string()))
            .await?;
        let reservations: Vec<Reservation> = result.take(0)?;
        Ok(reservations)
    }

    /// Open reservation for a member+book pair (duplicate guard input)
    pub async fn find_open_by_member_and_book(
        &self,
        member: &RecordId,
        book: &RecordId,
    ) -> RepoResult<Option<Reservation>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM book_reservation WHERE member = $member AND book = $book \
                 AND status IN ['pending', 'ready'] LIMIT 1",
            )
            .bind(("member", member.to_string()))
            .bind(("book", book.to_string()))
            .await?;
        let reservations: Vec<Reservation> = result.take(0)?;
        Ok(reservations.into_iter().next())
    }

    /// Count of all open reservations (dashboard figure)
    pub async fn count_open(&self) -> RepoResult<u64> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            total: u64,
        }
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM book_reservation \
                 WHERE status IN ['pending', 'ready'] GROUP ALL",
            )
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    /// Open (pending) reservations for a title — blocks renewals
    pub async fn count_pending_by_book(&self, book: &RecordId) -> RepoResult<u64> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            total: u64,
        }
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM book_reservation \
                 WHERE book = $book AND status = 'pending' GROUP ALL",
            )
            .bind(("book", book.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    /// Open reservations whose hold window has lapsed (sweep input)
    pub async fn find_expired_open(&self, now: i64, limit: usize) -> RepoResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT * FROM book_reservation WHERE status IN ['pending', 'ready'] \
             AND expires_at < $now ORDER BY expires_at LIMIT {}",
            limit
        );
        let mut result = self.base.db().query(&sql).bind(("now", now)).await?;
        let reservations: Vec<Reservation> = result.take(0)?;
        Ok(reservations)
    }
}
