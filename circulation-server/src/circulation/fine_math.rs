//! Fine arithmetic (罚款计算)
//!
//! 金额落库是 f64，所有运算经过 Decimal，避免多日罚款累加出现
//! 浮点尾差。

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::db::models::{BookCondition, LibrarySettings};

/// f64 → Decimal (落库值精度足够，NaN/Inf 归零)
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Decimal → f64 (四舍五入到分)
pub fn to_f64(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}

/// 归还罚款 = 逾期天数 × 日罚款 + 条件罚款 (损坏/遗失为一次性定额)
pub fn compute_fine(days_overdue: u32, condition: BookCondition, settings: &LibrarySettings) -> f64 {
    let mut fine = Decimal::from(days_overdue) * to_decimal(settings.overdue_fine_per_day);

    match condition {
        BookCondition::Good => {}
        BookCondition::Damaged => fine += to_decimal(settings.damage_fine),
        BookCondition::Lost => fine += to_decimal(settings.lost_book_fine),
    }

    to_f64(fine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LibrarySettings {
        LibrarySettings::default()
    }

    #[test]
    fn on_time_good_return_is_free() {
        assert_eq!(compute_fine(0, BookCondition::Good, &settings()), 0.0);
    }

    #[test]
    fn ten_days_overdue_at_ten_per_day() {
        // due 2024-01-01, returned 2024-01-11, rate 10 → 100
        assert_eq!(compute_fine(10, BookCondition::Good, &settings()), 100.0);
    }

    #[test]
    fn lost_book_flat_fine_without_overdue() {
        assert_eq!(compute_fine(0, BookCondition::Lost, &settings()), 2000.0);
    }

    #[test]
    fn damaged_fine_stacks_on_overdue() {
        // 3 days overdue + damage: 3*10 + 500
        assert_eq!(compute_fine(3, BookCondition::Damaged, &settings()), 530.0);
    }

    #[test]
    fn fractional_rates_do_not_drift() {
        let mut s = settings();
        s.overdue_fine_per_day = 0.1;
        // 1000 days at 0.1/day must be exactly 100, not 99.9999...
        assert_eq!(compute_fine(1000, BookCondition::Good, &s), 100.0);
    }
}
