//! Library Settings Repository (单例配置记录)

use super::{BaseRepository, RepoResult};
use crate::db::models::LibrarySettings;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const SETTINGS_TABLE: &str = "library_settings";
const SETTINGS_ID: &str = "main";

#[derive(Clone)]
pub struct SettingsRepository {
    base: BaseRepository,
}

impl SettingsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Read settings, falling back to defaults when the record is absent
    pub async fn get(&self) -> RepoResult<LibrarySettings> {
        let settings: Option<LibrarySettings> =
            self.base.db().select((SETTINGS_TABLE, SETTINGS_ID)).await?;
        Ok(settings.unwrap_or_default())
    }

    /// Replace settings with the merged record
    pub async fn put(&self, mut settings: LibrarySettings) -> RepoResult<LibrarySettings> {
        settings.updated_at = Some(shared::util::now_millis());
        let stored: Option<LibrarySettings> = self
            .base
            .db()
            .upsert((SETTINGS_TABLE, SETTINGS_ID))
            .content(settings)
            .await?;
        Ok(stored.unwrap_or_default())
    }
}
