//! Settings API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{LibrarySettings, LibrarySettingsUpdate};
use crate::db::repository::SettingsRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/settings - 当前借阅策略
pub async fn get_settings(State(state): State<ServerState>) -> AppResult<Json<LibrarySettings>> {
    let settings = SettingsRepository::new(state.get_db()).get().await?;
    Ok(Json(settings))
}

/// PUT /api/settings - 更新借阅策略 (部分字段)
pub async fn update_settings(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<LibrarySettingsUpdate>,
) -> AppResult<Json<LibrarySettings>> {
    validate_update(&payload)?;

    let repo = SettingsRepository::new(state.get_db());
    let current = repo.get().await?;
    let merged = current.merged_with(&payload);
    let stored = repo.put(merged).await?;

    state
        .audit
        .log(
            AuditAction::SettingsChanged,
            "settings",
            "library_settings:main",
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::to_value(&payload).unwrap_or_default(),
        )
        .await;

    Ok(Json(stored))
}

fn validate_update(update: &LibrarySettingsUpdate) -> Result<(), AppError> {
    fn positive_days(value: Option<i64>, field: &str) -> Result<(), AppError> {
        if let Some(v) = value
            && !(1..=3650).contains(&v)
        {
            return Err(AppError::validation(format!(
                "{field} must be between 1 and 3650 days"
            )));
        }
        Ok(())
    }
    fn non_negative_amount(value: Option<f64>, field: &str) -> Result<(), AppError> {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(AppError::validation(format!("{field} must not be negative")));
        }
        Ok(())
    }

    positive_days(update.loan_period_days, "loan_period_days")?;
    positive_days(update.reservation_expiry_days, "reservation_expiry_days")?;
    positive_days(update.membership_validity_days, "membership_validity_days")?;
    non_negative_amount(update.overdue_fine_per_day, "overdue_fine_per_day")?;
    non_negative_amount(update.damage_fine, "damage_fine")?;
    non_negative_amount(update.lost_book_fine, "lost_book_fine")?;

    if let Some(v) = update.max_renewals
        && !(0..=10).contains(&v)
    {
        return Err(AppError::validation("max_renewals must be between 0 and 10"));
    }
    if let Some(v) = update.default_max_books
        && !(1..=50).contains(&v)
    {
        return Err(AppError::validation(
            "default_max_books must be between 1 and 50",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_fine_rate() {
        let update = LibrarySettingsUpdate {
            overdue_fine_per_day: Some(-1.0),
            ..Default::default()
        };
        assert!(validate_update(&update).is_err());
    }

    #[test]
    fn accepts_reasonable_policy() {
        let update = LibrarySettingsUpdate {
            loan_period_days: Some(21),
            overdue_fine_per_day: Some(5.0),
            max_renewals: Some(3),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());
    }
}
