//! Staff Model (馆员账户)

use super::serde_helpers;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type StaffId = RecordId;

/// Staff entity (馆员/管理员登录账户)
///
/// `role` 只取 `admin` / `librarian`；权限由 auth::permissions 的
/// 策略表统一给出，不在账户上逐条存储。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<StaffId>,

    pub username: String,
    pub display_name: String,

    /// Argon2 哈希 — 永不序列化出库 (落库走显式 SET)
    #[serde(skip_serializing)]
    pub hash_pass: String,

    pub role: String,

    /// 系统内建账户 (默认 admin) 不可删除
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_system: bool,

    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,

    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Staff {
    /// Hash a plaintext password with Argon2id
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    /// Verify a plaintext password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash_pass) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Create payload
#[derive(Debug, Clone, Deserialize)]
pub struct StaffCreate {
    pub username: String,
    pub display_name: Option<String>,
    pub password: String,
    pub role: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = Staff::hash_password("correct horse").unwrap();
        let staff = Staff {
            id: None,
            username: "desk".into(),
            display_name: "Desk".into(),
            hash_pass: hash,
            role: "librarian".into(),
            is_system: false,
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        assert!(staff.verify_password("correct horse"));
        assert!(!staff.verify_password("battery staple"));
    }
}
