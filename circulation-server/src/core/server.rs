//! Server Implementation
//!
//! HTTP 服务器启动、优雅关闭与后台任务生命周期

use tokio::sync::mpsc;

use crate::audit::{AuditAction, AuditLogRequest};
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, ServerState};
use crate::utils::AppError;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<(ServerState, mpsc::Receiver<AuditLogRequest>)>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests and embedded setups)
    pub fn with_state(
        config: Config,
        state: ServerState,
        audit_rx: mpsc::Receiver<AuditLogRequest>,
    ) -> Self {
        Self {
            config,
            state: Some((state, audit_rx)),
        }
    }

    pub async fn run(self) -> Result<(), AppError> {
        let (state, audit_rx) = match self.state {
            Some(pair) => pair,
            None => ServerState::initialize(&self.config).await,
        };

        // Start background tasks (audit worker, expiry sweeper)
        let mut tasks = BackgroundTasks::new();
        state.start_background_tasks(audit_rx, &mut tasks);
        tracing::info!("Background tasks registered: {}", tasks.len());

        if let Err(e) = state
            .audit
            .log_sync(
                AuditAction::SystemStartup,
                "system",
                "server:main",
                serde_json::json!({ "environment": state.config.environment }),
            )
            .await
        {
            tracing::error!("Failed to record startup audit entry: {:?}", e);
        }

        let app = crate::api::router(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Circulation server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        let shutdown_state = state.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
                if let Err(e) = shutdown_state
                    .audit
                    .log_sync(
                        AuditAction::SystemShutdown,
                        "system",
                        "server:main",
                        serde_json::json!({}),
                    )
                    .await
                {
                    tracing::error!("Failed to record shutdown audit entry: {:?}", e);
                }
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        // HTTP 已停。释放 state 里的审计服务引用，审计通道随之关闭，
        // worker 才能从 recv() 退出
        drop(state);
        tasks.shutdown().await;

        Ok(())
    }
}
