//! Library Settings Model (全局借阅策略)
//!
//! 单例记录。所有流程读取它获取借期、罚款费率、预约有效期等策略；
//! 缺失字段回退到这里的默认值。

use serde::{Deserialize, Serialize};

/// Global circulation policy (library_settings 单例)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// 借期 (天)
    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: i64,

    /// 每日逾期罚款 (LKR)
    #[serde(default = "default_overdue_fine_per_day")]
    pub overdue_fine_per_day: f64,

    /// 损坏罚款 (LKR, 一次性)
    #[serde(default = "default_damage_fine")]
    pub damage_fine: f64,

    /// 遗失罚款 (LKR, 一次性)
    #[serde(default = "default_lost_book_fine")]
    pub lost_book_fine: f64,

    /// 预约保留天数
    #[serde(default = "default_reservation_expiry_days")]
    pub reservation_expiry_days: i64,

    /// 单笔借阅最大续借次数
    #[serde(default = "default_max_renewals")]
    pub max_renewals: i64,

    /// 新会员默认可借册数
    #[serde(default = "default_max_books")]
    pub default_max_books: i64,

    /// 会员有效期 (天)
    #[serde(default = "default_membership_validity_days")]
    pub membership_validity_days: i64,

    pub updated_at: Option<i64>,
}

fn default_loan_period_days() -> i64 {
    14
}
fn default_overdue_fine_per_day() -> f64 {
    10.0
}
fn default_damage_fine() -> f64 {
    500.0
}
fn default_lost_book_fine() -> f64 {
    2000.0
}
fn default_reservation_expiry_days() -> i64 {
    7
}
fn default_max_renewals() -> i64 {
    2
}
fn default_max_books() -> i64 {
    5
}
fn default_membership_validity_days() -> i64 {
    365
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            loan_period_days: default_loan_period_days(),
            overdue_fine_per_day: default_overdue_fine_per_day(),
            damage_fine: default_damage_fine(),
            lost_book_fine: default_lost_book_fine(),
            reservation_expiry_days: default_reservation_expiry_days(),
            max_renewals: default_max_renewals(),
            default_max_books: default_max_books(),
            membership_validity_days: default_membership_validity_days(),
            updated_at: None,
        }
    }
}

/// Update payload — partial, applied over the stored record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_period_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_fine_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_fine: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_book_fine: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_expiry_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_renewals: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_max_books: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_validity_days: Option<i64>,
}

impl LibrarySettings {
    /// Apply a partial update, returning the merged settings
    pub fn merged_with(&self, update: &LibrarySettingsUpdate) -> Self {
        Self {
            loan_period_days: update.loan_period_days.unwrap_or(self.loan_period_days),
            overdue_fine_per_day: update
                .overdue_fine_per_day
                .unwrap_or(self.overdue_fine_per_day),
            damage_fine: update.damage_fine.unwrap_or(self.damage_fine),
            lost_book_fine: update.lost_book_fine.unwrap_or(self.lost_book_fine),
            reservation_expiry_days: update
                .reservation_expiry_days
                .unwrap_or(self.reservation_expiry_days),
            max_renewals: update.max_renewals.unwrap_or(self.max_renewals),
            default_max_books: update.default_max_books.unwrap_or(self.default_max_books),
            membership_validity_days: update
                .membership_validity_days
                .unwrap_or(self.membership_validity_days),
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let s = LibrarySettings::default();
        assert_eq!(s.loan_period_days, 14);
        assert_eq!(s.overdue_fine_per_day, 10.0);
        assert_eq!(s.damage_fine, 500.0);
        assert_eq!(s.lost_book_fine, 2000.0);
        assert_eq!(s.reservation_expiry_days, 7);
        assert_eq!(s.max_renewals, 2);
        assert_eq!(s.default_max_books, 5);
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let base = LibrarySettings::default();
        let update = LibrarySettingsUpdate {
            overdue_fine_per_day: Some(15.0),
            ..Default::default()
        };
        let merged = base.merged_with(&update);
        assert_eq!(merged.overdue_fine_per_day, 15.0);
        assert_eq!(merged.loan_period_days, 14);
    }
}
