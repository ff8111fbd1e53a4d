//! 审计日志类型定义
//!
//! 流通台账的核心数据结构。所有条目不可变、不可删除，
//! SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 系统生命周期 ═══
    /// 系统启动
    SystemStartup,
    /// 系统正常关闭
    SystemShutdown,

    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,

    // ═══ 流通（核心台账）═══
    /// 借出
    BookCheckedOut,
    /// 归还
    BookReturned,
    /// 续借
    LoanRenewed,

    // ═══ 预约 ═══
    /// 预约创建
    ReservationPlaced,
    /// 预约取消
    ReservationCancelled,
    /// 预约到书
    ReservationReady,
    /// 预约取书
    ReservationCollected,
    /// 定时清扫过期
    ReservationsExpired,

    // ═══ 罚款 ═══
    /// 缴款
    FinePaid,
    /// 减免
    FineWaived,

    // ═══ 管理操作 ═══
    /// 会员注册
    MemberRegistered,
    /// 会员更新
    MemberUpdated,
    /// 会员照片上传
    MemberPhotoUploaded,
    /// 馆藏创建
    InventoryCreated,
    /// 馆藏更新
    InventoryUpdated,
    /// 馆藏删除
    InventoryDeleted,
    /// 馆员账户创建
    StaffCreated,

    // ═══ 系统配置 ═══
    /// 借阅策略变更
    SettingsChanged,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链，确保防篡改。
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub id: u64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 资源类型（如 "loan", "member", "system"）
    pub resource_type: String,
    /// 资源 ID（如 "book_loan:xxx", "LIB-2026-1234"）
    pub resource_id: String,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<String>,
    /// 操作人名称
    pub operator_name: Option<String>,
    /// 结构化详情（JSON，含人读备注）
    pub details: serde_json::Value,
    /// 前一条审计日志哈希
    pub prev_hash: String,
    /// 当前记录哈希（SHA256）
    pub curr_hash: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 操作类型过滤
    pub action: Option<AuditAction>,
    /// 操作人 ID 过滤
    pub operator_id: Option<String>,
    /// 资源类型过滤
    pub resource_type: Option<String>,
    /// 分页偏移
    #[serde(default)]
    pub offset: usize,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: u64,
}

/// 审计链验证结果
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    /// 验证的记录总数
    pub total_entries: u64,
    /// 链是否完整
    pub chain_intact: bool,
    /// 断裂点列表
    pub breaks: Vec<AuditChainBreak>,
}

/// 审计链断裂点
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// 断裂处的序列号
    pub entry_id: u64,
    /// 期望的哈希
    pub expected: String,
    /// 实际的哈希
    pub actual: String,
}
