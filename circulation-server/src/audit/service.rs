//! 审计日志服务
//!
//! `AuditService` 提供：
//! - 日志写入（通过 mpsc 通道异步接收）
//! - 日志查询（直接读取 SurrealDB）
//! - 链验证

use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::mpsc;

use super::storage::{AuditStorage, AuditStorageError};
use super::types::*;

/// 发送到 AuditService 的日志请求
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    pub details: serde_json::Value,
}

/// 审计日志服务
///
/// 通过 mpsc 通道接收日志请求，后台 worker 异步写入 SurrealDB。
/// 查询操作直接读取 storage。
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// 创建审计服务，返回 (service, worker 消费端)
    pub fn new(
        db: Surreal<Db>,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let storage = AuditStorage::new(db);
        let service = Arc::new(Self { storage, tx });
        (service, rx)
    }

    /// 异步记录审计日志（非阻塞）
    ///
    /// 通过 mpsc 通道发送到后台 worker。
    /// 如果通道满，阻塞等待（审计日志不允许丢失）。
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        operator_id: Option<String>,
        operator_name: Option<String>,
        details: serde_json::Value,
    ) {
        let req = AuditLogRequest {
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            operator_id,
            operator_name,
            details,
        };

        // 阻塞发送 — 审计日志不允许丢失
        if self.tx.send(req).await.is_err() {
            tracing::error!("Audit log channel closed — audit entry lost!");
        }
    }

    /// 直接写入审计日志（用于启动/关闭等场景）
    pub async fn log_sync(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Result<AuditEntry, AuditStorageError> {
        self.storage
            .append(
                action,
                resource_type.into(),
                resource_id.into(),
                None,
                None,
                details,
            )
            .await
    }

    /// 查询审计日志
    pub async fn query(
        &self,
        q: &AuditQuery,
    ) -> Result<(Vec<AuditEntry>, u64), AuditStorageError> {
        self.storage.query(q).await
    }

    /// 验证审计链完整性
    pub async fn verify_chain(
        &self,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<AuditChainVerification, AuditStorageError> {
        self.storage.verify_chain(from, to).await
    }

    /// 获取存储引用
    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }
}
