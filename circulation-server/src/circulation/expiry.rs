//! Reservation expiry sweep (预约过期清扫)
//!
//! 启动时先补扫一轮，之后按固定间隔运行。每条过期预约在自己的
//! 事务里完成状态迁移 + 计数释放，清扫可安全重入。
//!
//! 注册为 `TaskKind::Periodic`，由 `start_background_tasks()` 启动。

use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio_util::sync::CancellationToken;

use super::{check_transaction, map_db_error};
use crate::audit::{AuditAction, AuditService};
use crate::db::repository::ReservationRepository;
use crate::utils::AppResult;

/// 每轮单次查询的批大小
const SWEEP_BATCH: usize = 100;

const EXPIRE_SQL: &str = "\
BEGIN TRANSACTION; \
LET $rows = (SELECT * FROM $res_rid); \
IF array::len($rows) == 0 { THROW 'reservation:not_found' }; \
LET $r = $rows[0]; \
IF $r.status != 'pending' AND $r.status != 'ready' { THROW 'reservation:not_open' }; \
IF $r.expires_at >= $now { THROW 'reservation:not_open' }; \
UPDATE $res_rid SET status = 'expired', updated_at = $now; \
UPDATE $book_rid SET total_reservations -= 1, updated_at = $now; \
COMMIT TRANSACTION;";

/// 预约过期清扫器
pub struct ReservationExpirySweeper {
    db: Surreal<Db>,
    audit: Arc<AuditService>,
    shutdown: CancellationToken,
    interval: std::time::Duration,
}

impl ReservationExpirySweeper {
    pub fn new(
        db: Surreal<Db>,
        audit: Arc<AuditService>,
        shutdown: CancellationToken,
        interval: std::time::Duration,
    ) -> Self {
        Self {
            db,
            audit,
            shutdown,
            interval,
        }
    }

    /// 主循环：启动补扫 → 周期触发
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reservation expiry sweeper started"
        );

        // 启动补扫
        self.sweep_and_report().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reservation expiry sweeper received shutdown signal");
                    return;
                }
            }
            self.sweep_and_report().await;
        }
    }

    async fn sweep_and_report(&self) {
        match self.sweep_once().await {
            Ok(0) => tracing::debug!("Expiry sweep: nothing to do"),
            Ok(count) => {
                tracing::info!(count, "Expiry sweep: reservations expired");
                self.audit
                    .log(
                        AuditAction::ReservationsExpired,
                        "reservation",
                        "sweep",
                        None,
                        None,
                        serde_json::json!({ "expired": count }),
                    )
                    .await;
            }
            Err(e) => tracing::error!("Expiry sweep failed: {}", e),
        }
    }

    /// 执行一轮清扫，返回过期的预约数
    pub async fn sweep_once(&self) -> AppResult<usize> {
        let repo = ReservationRepository::new(self.db.clone());
        let mut total = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let now = shared::util::now_millis();
            let batch = repo.find_expired_open(now, SWEEP_BATCH).await?;
            if batch.is_empty() {
                break;
            }

            for reservation in &batch {
                let Some(res_rid) = reservation.id.clone() else {
                    continue;
                };
                let result = match self
                    .db
                    .query(EXPIRE_SQL)
                    .bind(("res_rid", res_rid))
                    .bind(("book_rid", reservation.book.clone()))
                    .bind(("now", now))
                    .await
                {
                    Ok(mut response) => check_transaction(&mut response),
                    Err(e) => Err(map_db_error(e)),
                };

                match result {
                    Ok(_) => {
                        total += 1;
                        tracing::debug!(
                            reservation_no = %reservation.reservation_no,
                            "Reservation expired"
                        );
                    }
                    // 另一个事务抢先改了状态 — 跳过即可
                    Err(crate::utils::AppError::BusinessRule(_)) => {}
                    Err(crate::utils::AppError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }

            if batch.len() < SWEEP_BATCH {
                break;
            }
        }

        Ok(total)
    }
}
