//! Loan Repository
//!
//! 只读查询。借出/归还/续借写入见 `circulation` 模块。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Loan;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct LoanRepository {
    base: BaseRepository,
}

impl LoanRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Loan>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let loan: Option<Loan> = self.base.db().select(thing).await?;
        Ok(loan)
    }

    pub async fn find_by_loan_no(&self, loan_no: &str) -> RepoResult<Option<Loan>> {
        let loan_no = loan_no.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM book_loan WHERE loan_no = $loan_no LIMIT 1")
            .bind(("loan_no", loan_no))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans.into_iter().next())
    }

    /// Desk return lookup: active loan by loan reference or book id
    pub async fn find_active_by_term(&self, term: &str) -> RepoResult<Option<Loan>> {
        let term = term.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM book_loan WHERE status = 'active' \
                 AND (loan_no = $term OR book_id = $term) \
                 ORDER BY checkout_date DESC LIMIT 1",
            )
            .bind(("term", term))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans.into_iter().next())
    }

    /// All active loans, soonest due first
    pub async fn find_active(&self) -> RepoResult<Vec<Loan>> {
        let loans: Vec<Loan> = self
            .base
            .db()
            .query("SELECT * FROM book_loan WHERE status = 'active' ORDER BY due_date")
            .await?
            .take(0)?;
        Ok(loans)
    }

    pub async fn find_active_by_member(&self, member: &RecordId) -> RepoResult<Vec<Loan>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM book_loan WHERE status = 'active' AND member = $member \
                 ORDER BY due_date",
            )
            .bind(("member", member.to_string()))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans)
    }

    /// Active loans already past their due date
    pub async fn find_overdue(&self, now: i64) -> RepoResult<Vec<Loan>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM book_loan WHERE status = 'active' AND due_date < $now \
                 ORDER BY due_date",
            )
            .bind(("now", now))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans)
    }

    /// Full borrowing history for a member, newest first
    pub async fn history_by_member(&self, member: &RecordId) -> RepoResult<Vec<Loan>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM book_loan WHERE member = $member ORDER BY checkout_date DESC")
            .bind(("member", member.to_string()))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans)
    }

    /// Circulation history for a title, newest first
    pub async fn history_by_book(&self, book_id: &str) -> RepoResult<Vec<Loan>> {
        let book_id = book_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM book_loan WHERE book_id = $book_id ORDER BY checkout_date DESC")
            .bind(("book_id", book_id))
            .await?;
        let loans: Vec<Loan> = result.take(0)?;
        Ok(loans)
    }

    /// Returned loans whose copy was declared lost — the drift report input
    pub async fn count_lost_returns(&self) -> RepoResult<u64> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            total: u64,
        }
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM book_loan \
                 WHERE status = 'returned' AND book_condition = 'lost' GROUP ALL",
            )
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
