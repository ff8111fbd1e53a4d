//! Staff Repository (馆员账户)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Staff, StaffCreate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct StaffRepository {
    base: BaseRepository,
}

impl StaffRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Staff>> {
        let staff: Vec<Staff> = self
            .base
            .db()
            .query("SELECT * FROM staff WHERE is_active = true ORDER BY username")
            .await?
            .take(0)?;
        Ok(staff)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Staff>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let staff: Option<Staff> = self.base.db().select(thing).await?;
        Ok(staff)
    }

    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<Staff>> {
        let username = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM staff WHERE username = $username LIMIT 1")
            .bind(("username", username))
            .await?;
        let staff: Vec<Staff> = result.take(0)?;
        Ok(staff.into_iter().next())
    }

    pub async fn create(&self, data: StaffCreate) -> RepoResult<Staff> {
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let hash_pass = Staff::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;
        let display_name = data.display_name.unwrap_or_else(|| data.username.clone());

        self.insert(data.username, display_name, hash_pass, data.role, false)
            .await
    }

    /// hash_pass 被标记为 skip_serializing，落库必须走显式 SET
    async fn insert(
        &self,
        username: String,
        display_name: String,
        hash_pass: String,
        role: String,
        is_system: bool,
    ) -> RepoResult<Staff> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE staff SET
                    username = $username,
                    display_name = $display_name,
                    hash_pass = $hash_pass,
                    role = $role,
                    is_system = $is_system,
                    is_active = true,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("username", username))
            .bind(("display_name", display_name))
            .bind(("hash_pass", hash_pass))
            .bind(("role", role))
            .bind(("is_system", is_system))
            .bind(("now", shared::util::now_millis()))
            .await?;

        let created: Option<Staff> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create staff account".to_string()))
    }

    /// Create the built-in admin account on first startup.
    ///
    /// 密码来自 ADMIN_PASSWORD 环境变量；未设置时生成随机密码并打印
    /// 一次，强迫运维记录下来。
    pub async fn ensure_default_admin(&self) -> RepoResult<()> {
        if self.find_by_username("admin").await?.is_some() {
            return Ok(());
        }

        let password = match std::env::var("ADMIN_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => {
                let generated = generate_password();
                tracing::warn!(
                    "ADMIN_PASSWORD not set — generated initial admin password: {}",
                    generated
                );
                generated
            }
        };

        let hash_pass = Staff::hash_password(&password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        self.insert(
            "admin".to_string(),
            "Administrator".to_string(),
            hash_pass,
            "admin".to_string(),
            true,
        )
        .await?;
        tracing::info!("Created built-in admin account");
        Ok(())
    }
}

/// Random 16-char alphanumeric password for the bootstrap admin
fn generate_password() -> String {
    use ring::rand::{SecureRandom, SystemRandom};
    const CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 16];
    if rng.fill(&mut bytes).is_err() {
        return "change-me-immediately".to_string();
    }
    bytes
        .iter()
        .map(|b| CHARS[*b as usize % CHARS.len()] as char)
        .collect()
}
