//! 服务器配置
//!
//! # 环境变量
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/library/circulation | 工作目录 |
//! | HTTP_PORT | 4000 | HTTP 服务端口 |
//! | ENVIRONMENT | development | 运行环境 |
//! | LIBRARY_TIMEZONE | Asia/Colombo | 业务时区 (到期日计算) |
//! | RESERVATION_SWEEP_INTERVAL_SECS | 3600 | 预约过期清扫间隔 |
//! | JWT_SECRET / JWT_EXPIRATION_MINUTES | — | 见 auth::jwt |
//!
//! 注意：借期、罚款费率等借阅策略不是环境配置，而是数据库里的
//! `library_settings` 单例记录 (可由管理员在线修改)。

use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志、上传文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区 (IANA 名称)
    pub timezone: String,
    /// 预约过期清扫间隔 (秒)
    pub reservation_sweep_interval_secs: u64,
    /// 审计日志通道容量
    pub audit_buffer_size: usize,
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/library/circulation".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("LIBRARY_TIMEZONE").unwrap_or_else(|_| "Asia/Colombo".into()),
            reservation_sweep_interval_secs: std::env::var("RESERVATION_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3600),
            audit_buffer_size: std::env::var("AUDIT_BUFFER_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
        }
    }

    /// 使用自定义值覆盖部分配置（测试场景）
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 上传文件目录 (work_dir/uploads)
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 设置进程环境 (dotenv + 日志)
///
/// 必须在读取 Config 之前调用。
pub fn setup_environment() {
    let _ = dotenv::dotenv();

    let log_dir = std::env::var("LOG_DIR").ok();
    crate::utils::logger::init_logger_with_file(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        log_dir.as_deref(),
    );
}
