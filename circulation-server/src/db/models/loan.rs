//! Loan Model (借阅记录)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type LoanId = RecordId;

/// Loan status — a loan is closed exactly once
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
}

/// Condition recorded at return time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookCondition {
    Good,
    Damaged,
    Lost,
}

/// Loan entity (借阅)
///
/// 由 checkout 事务创建，checkin 事务关闭，永不删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<LoanId>,

    /// 借阅凭据号 (如 LOAN-88123456789)
    pub loan_no: String,

    /// 会员记录引用
    #[serde(with = "serde_helpers::record_id")]
    pub member: RecordId,

    /// 会员编号快照
    pub member_no: String,
    pub member_name: String,

    /// 馆藏记录引用
    #[serde(with = "serde_helpers::record_id")]
    pub book: RecordId,

    /// 书目 ID / 标题快照
    pub book_id: String,
    pub book_title: String,

    /// 借出时间 (Unix millis)
    pub checkout_date: i64,

    /// 到期时间 = checkout_date + loan_period_days
    pub due_date: i64,

    pub status: LoanStatus,

    #[serde(default)]
    pub renewal_count: i64,
    pub max_renewals: i64,

    /// 以下字段在归还时填写
    #[serde(default)]
    pub days_overdue: i64,
    #[serde(default)]
    pub fine_amount: f64,
    pub book_condition: Option<BookCondition>,
    pub damage_notes: Option<String>,
    pub return_date: Option<i64>,

    /// 经手馆员快照 (借出)
    pub librarian_id: Option<String>,
    pub librarian_name: Option<String>,

    /// 归还经手馆员
    pub returned_by: Option<String>,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}
