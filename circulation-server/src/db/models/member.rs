//! Member Model (读者/会员)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type MemberId = RecordId;

/// Membership status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Suspended,
}

impl Default for MemberStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Member category — drives nothing mechanically; kept for reporting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Researcher,
    Student,
    Public,
}

/// Member entity (图书馆会员)
///
/// 计数器字段 (`current_books_borrowed`, `fine_balance`) 只由
/// circulation 事务修改，handler 不直接写。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<MemberId>,

    /// 会员编号 (借书证号, 如 LIB-2026-4821)
    pub member_no: String,

    /// 外部认证系统的用户 ID
    pub uid: String,

    pub email: String,
    pub full_name: String,

    /// 身份证号
    pub nic: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub organization: Option<String>,

    pub member_type: MemberType,

    #[serde(default)]
    pub status: MemberStatus,

    /// 入会时间 (Unix millis)
    pub membership_date: i64,

    /// 会员有效期截止 (Unix millis)
    pub membership_expiry: i64,

    /// 可同时借阅的最大册数
    pub max_books_allowed: i64,

    /// 当前借出册数 — 不变式: `<= max_books_allowed` (由借出事务保证)
    #[serde(default)]
    pub current_books_borrowed: i64,

    /// 累计借阅总数
    #[serde(default)]
    pub total_books_borrowed_lifetime: i64,

    /// 逾期次数
    #[serde(default)]
    pub overdue_count: i64,

    /// 未缴罚款余额 (LKR)。任何正值都会阻止借出和预约
    #[serde(default)]
    pub fine_balance: f64,

    /// 会员照片在工作目录中的相对路径
    pub photo_path: Option<String>,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    /// 外部认证系统的用户 ID
    pub uid: String,
    pub email: String,
    pub full_name: String,
    pub nic: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub organization: Option<String>,
    pub member_type: MemberType,
}

/// Update payload — all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_books_allowed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_expiry: Option<i64>,
}
