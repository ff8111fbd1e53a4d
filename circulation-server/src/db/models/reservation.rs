//! Reservation Model (预约)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ReservationId = RecordId;

/// Reservation lifecycle
///
/// pending → ready (馆员), pending/ready → cancelled (会员或馆员),
/// ready → collected (馆员), pending/ready → expired (定时清扫)。
/// collected / cancelled / expired 为终态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Ready,
    Collected,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    /// 仍占用 `total_reservations` 计数的状态
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Ready)
    }
}

/// Reservation entity (预约)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ReservationId>,

    /// 预约凭据号 (如 RES-88123456789)
    pub reservation_no: String,

    #[serde(with = "serde_helpers::record_id")]
    pub member: RecordId,
    pub member_no: String,
    pub member_name: String,
    pub member_email: Option<String>,
    pub member_phone: Option<String>,

    #[serde(with = "serde_helpers::record_id")]
    pub book: RecordId,
    pub book_id: String,
    pub book_title: String,

    pub status: ReservationStatus,

    /// 预约时间 (Unix millis)
    pub reserved_at: i64,

    /// 到书时间 (转 ready 时写入)
    pub ready_at: Option<i64>,

    /// 过期时间 = reserved_at + reservation_expiry_days
    pub expires_at: i64,

    /// 队列优先级 (小数字优先)。记录但不参与自动分配
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// 到书通知是否已发送 (由外部通知系统消费)
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub notification_sent: bool,

    pub cancelled_at: Option<i64>,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

fn default_priority() -> i64 {
    1
}
