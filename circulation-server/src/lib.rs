//! Circulation Server - 图书馆流通服务
//!
//! # 架构概述
//!
//! 海洋研究院图书馆的借阅流通后端，提供以下核心功能：
//!
//! - **流通事务** (`circulation`): 借出/归还/续借/预约，全部校验与
//!   多文档写入在单个 SurrealDB 事务内完成
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储 (models + repositories)
//! - **认证** (`auth`): JWT + Argon2，集中式角色→权限策略表
//! - **审计台账** (`audit`): append-only SHA256 哈希链
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! circulation-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、权限
//! ├── db/            # 数据库层 (models / repositories)
//! ├── circulation/   # 流通业务事务 + 过期清扫
//! ├── audit/         # 审计台账
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、时间、校验
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod circulation;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState, setup_environment};
pub use utils::{AppError, AppResponse, AppResult};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   ______ _                 __      __  _
  / ____/(_)____________  _/ /___ _/ /_(_)___  ____
 / /    / / ___/ ___/ / / / / __ `/ __/ / __ \/ __ \
/ /___ / / /  / /__/ /_/ / / /_/ / /_/ / /_/ / / / /
\____//_/_/   \___/\__,_/_/\__,_/\__/_/\____/_/ /_/
    "#
    );
}
