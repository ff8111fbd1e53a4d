//! 服务器状态
//!
//! `ServerState` 持有所有服务的共享引用，作为 axum 的应用状态随
//! 请求克隆（Arc 浅拷贝，成本极低）。

use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::mpsc;

use crate::audit::{AuditLogRequest, AuditService, AuditWorker};
use crate::auth::JwtService;
use crate::circulation::ReservationExpirySweeper;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::db::repository::StaffRepository;

/// 服务器状态 - 持有所有服务的单例引用
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 审计台账服务
    pub audit: Arc<AuditService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/circulation.db) + schema
    /// 3. 内建 admin 账户
    /// 4. JWT / 审计服务
    ///
    /// 返回 (state, 审计通道消费端)；消费端交给
    /// [`start_background_tasks`](Self::start_background_tasks)。
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic。
    pub async fn initialize(config: &Config) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("circulation.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_db(config.clone(), db_service.db).await
    }

    /// 在已有数据库连接上构建状态（集成测试用 kv-mem 连接走这里）
    pub async fn with_db(
        config: Config,
        db: Surreal<Db>,
    ) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        StaffRepository::new(db.clone())
            .ensure_default_admin()
            .await
            .expect("Failed to bootstrap admin account");

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let (audit, audit_rx) = AuditService::new(db.clone(), config.audit_buffer_size);

        let state = Self {
            config,
            db,
            jwt_service,
            audit,
        };
        (state, audit_rx)
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 前调用一次：
    /// - 审计写入 worker
    /// - 预约过期清扫
    pub fn start_background_tasks(
        &self,
        audit_rx: mpsc::Receiver<AuditLogRequest>,
        tasks: &mut BackgroundTasks,
    ) {
        let worker = AuditWorker::new(self.audit.storage().clone());
        tasks.spawn("audit_worker", TaskKind::Worker, async move {
            worker.run(audit_rx).await;
        });

        let sweeper = ReservationExpirySweeper::new(
            self.db.clone(),
            self.audit.clone(),
            tasks.shutdown_token(),
            std::time::Duration::from_secs(self.config.reservation_sweep_interval_secs.max(1)),
        );
        tasks.spawn("reservation_expiry_sweeper", TaskKind::Periodic, async move {
            sweeper.run().await;
        });
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 业务时区
    pub fn business_timezone(&self) -> chrono_tz::Tz {
        crate::utils::time::parse_timezone(&self.config.timezone)
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("environment", &self.config.environment)
            .field("http_port", &self.config.http_port)
            .finish_non_exhaustive()
    }
}
