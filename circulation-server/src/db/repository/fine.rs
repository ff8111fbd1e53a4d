//! Fine Repository
//!
//! 只读查询。罚款的创建在归还事务里，缴款/减免在
//! `circulation::fines` 的事务里。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Fine, FineStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct FineRepository {
    base: BaseRepository,
}

impl FineRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Fine>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let fine: Option<Fine> = self.base.db().select(thing).await?;
        Ok(fine)
    }

    pub async fn find_all(&self, status: Option<FineStatus>) -> RepoResult<Vec<Fine>> {
        let fines: Vec<Fine> = match status {
            Some(status) => {
                let mut result = self
                    .base
                    .db()
                    .query(
                        "SELECT * FROM library_fine WHERE status = $status \
                         ORDER BY created_at DESC",
                    )
                    .bind(("status", status))
                    .await?;
                result.take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM library_fine ORDER BY created_at DESC")
                    .await?
                    .take(0)?
            }
        };
        Ok(fines)
    }

    pub async fn find_by_member(&self, member: &RecordId) -> RepoResult<Vec<Fine>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_fine WHERE member = $member ORDER BY created_at DESC")
            .bind(("member", member.to_string()))
            .await?;
        let fines: Vec<Fine> = result.take(0)?;
        Ok(fines)
    }

    pub async fn find_by_loan_no(&self, loan_no: &str) -> RepoResult<Vec<Fine>> {
        let loan_no = loan_no.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_fine WHERE loan_no = $loan_no ORDER BY created_at DESC")
            .bind(("loan_no", loan_no))
            .await?;
        let fines: Vec<Fine> = result.take(0)?;
        Ok(fines)
    }

    /// Sum of (amount - amount_paid) over unsettled fines — the reports figure.
    /// Summed in Decimal to avoid drift across many small amounts.
    pub async fn outstanding_total(&self) -> RepoResult<f64> {
        use rust_decimal::Decimal;
        use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

        #[derive(serde::Deserialize)]
        struct Row {
            amount: f64,
            #[serde(default)]
            amount_paid: f64,
        }
        let mut result = self
            .base
            .db()
            .query(
                "SELECT amount, amount_paid FROM library_fine \
                 WHERE status IN ['unpaid', 'partial']",
            )
            .await?;
        let rows: Vec<Row> = result.take(0)?;
        let total = rows.iter().fold(Decimal::ZERO, |acc, r| {
            acc + Decimal::from_f64(r.amount - r.amount_paid).unwrap_or_default()
        });
        Ok(total.to_f64().unwrap_or(0.0))
    }
}
