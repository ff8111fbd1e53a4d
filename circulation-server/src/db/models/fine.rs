//! Fine Model (罚款)
//!
//! 仅在归还产生罚款时创建；独立于 Loan 用于对账与报表。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type FineId = RecordId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FineType {
    Overdue,
    Damaged,
    Lost,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FineStatus {
    Unpaid,
    Partial,
    Paid,
    Waived,
}

/// Fine entity (罚款单)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fine {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<FineId>,

    #[serde(with = "serde_helpers::record_id")]
    pub member: RecordId,
    pub member_no: String,
    pub member_name: String,

    pub loan_no: String,
    pub book_id: String,
    pub book_title: String,

    pub fine_type: FineType,

    /// 应缴金额 (LKR)
    pub amount: f64,

    /// 已缴金额，允许分次缴纳
    #[serde(default)]
    pub amount_paid: f64,

    #[serde(default)]
    pub days_overdue: i64,

    pub status: FineStatus,

    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_date: Option<i64>,

    pub waived_by: Option<String>,
    pub waive_reason: Option<String>,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Pay request body
#[derive(Debug, Clone, Deserialize)]
pub struct FinePayment {
    pub amount: f64,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
}

/// Waive request body
#[derive(Debug, Clone, Deserialize)]
pub struct FineWaive {
    pub reason: String,
}
