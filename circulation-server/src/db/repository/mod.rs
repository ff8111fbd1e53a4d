//! Repository Module
//!
//! Read and single-document CRUD access to SurrealDB tables.
//! 跨文档的业务写入 (借出/归还/预约/缴款) 不在这里 —— 它们属于
//! `circulation` 模块的事务。

pub mod fine;
pub mod inventory;
pub mod loan;
pub mod member;
pub mod reservation;
pub mod settings;
pub mod staff;

pub use fine::FineRepository;
pub use inventory::InventoryRepository;
pub use loan::LoanRepository;
pub use member::MemberRepository;
pub use reservation::ReservationRepository;
pub use settings::SettingsRepository;
pub use staff::StaffRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Unique index violations surface as duplicates, not opaque DB errors
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

impl From<RepoError> for crate::utils::AppError {
    fn from(err: RepoError) -> Self {
        use crate::utils::AppError;
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
///
/// ID convention: 全栈统一使用 `surrealdb::RecordId` ("table:id" 字符串格式)。
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
