//! Audit Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::audit::{AuditChainVerification, AuditListResponse, AuditQuery};
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit-log - 查询审计台账
pub async fn query(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    let (items, total) = state.audit.query(&query).await?;
    Ok(Json(AuditListResponse { items, total }))
}

#[derive(serde::Deserialize)]
pub struct VerifyQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// GET /api/audit-log/verify - 验证哈希链完整性
pub async fn verify_chain(
    State(state): State<ServerState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<AuditChainVerification>> {
    let verification = state.audit.verify_chain(query.from, query.to).await?;
    Ok(Json(verification))
}
