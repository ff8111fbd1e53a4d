//! Inventory Model (馆藏条目)
//!
//! 一条记录对应一个书目 (title)，不是单册。单册去向只通过
//! `available_copies` / `total_copies` 计数跟踪。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type InventoryId = RecordId;

/// Inventory entity (馆藏)
///
/// 不变式: `0 <= available_copies <= total_copies`。
/// 唯一例外: `lost` 归还永久压低 available_copies (见 checkin 逻辑)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<InventoryId>,

    /// 书目 ID (目录系统侧的稳定标识)
    pub book_id: String,

    pub title: String,
    pub author: Option<String>,

    /// 索书号
    pub call_number: Option<String>,

    /// 资料类型 (book / journal / report / map ...)
    pub material_type: Option<String>,

    pub available_copies: i64,
    pub total_copies: i64,

    /// 累计借出次数
    #[serde(default)]
    pub total_checkouts: i64,

    /// 当前未终结的预约数
    #[serde(default)]
    pub total_reservations: i64,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Create payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCreate {
    pub book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub call_number: Option<String>,
    pub material_type: Option<String>,
    pub total_copies: i64,
}

/// Update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<i64>,
}
