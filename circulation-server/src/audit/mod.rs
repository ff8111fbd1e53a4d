//! 审计台账 (Transaction Log)
//!
//! 所有流通操作的 append-only 记录：借出、归还、续借、预约迁移、
//! 罚款结算、配置变更。条目以 SHA256 哈希链相连，查询与链验证
//! 通过 `/api/audit-log` 暴露。

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::{AuditStorage, AuditStorageError};
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditListResponse,
    AuditQuery,
};
pub use worker::AuditWorker;
