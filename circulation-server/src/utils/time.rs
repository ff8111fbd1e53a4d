//! 时间工具函数 — 业务时区转换与借阅日期计算
//!
//! 所有日期→时间戳转换统一在 API handler / action 层完成，
//! repository 层只接收 `i64` Unix millis。

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 一天的毫秒数
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时区字符串，失败 fallback 到 UTC
pub fn parse_timezone(tz: &str) -> Tz {
    tz.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid timezone '{}', falling back to UTC", tz);
        chrono_tz::UTC
    })
}

/// 日期 + 时分秒 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, sec).unwrap_or_else(|| {
        date.and_time(NaiveTime::MIN)
    });
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// 到期日 = 借出时间 + N 天
pub fn due_date_millis(checkout_millis: i64, loan_period_days: u32) -> i64 {
    checkout_millis + loan_period_days as i64 * DAY_MS
}

/// 逾期天数 = max(0, ceil((归还时间 - 到期日) / 1 天))
pub fn days_overdue(due_millis: i64, return_millis: i64) -> u32 {
    let late = return_millis - due_millis;
    if late <= 0 {
        return 0;
    }
    late.div_ceil(DAY_MS) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_adds_whole_days() {
        let checkout = 1_700_000_000_000;
        assert_eq!(due_date_millis(checkout, 14), checkout + 14 * DAY_MS);
    }

    #[test]
    fn overdue_zero_when_on_time() {
        let due = 1_700_000_000_000;
        assert_eq!(days_overdue(due, due), 0);
        assert_eq!(days_overdue(due, due - 1), 0);
        assert_eq!(days_overdue(due, due - 3 * DAY_MS), 0);
    }

    #[test]
    fn overdue_rounds_partial_days_up() {
        let due = 1_700_000_000_000;
        assert_eq!(days_overdue(due, due + 1), 1);
        assert_eq!(days_overdue(due, due + DAY_MS), 1);
        assert_eq!(days_overdue(due, due + DAY_MS + 1), 2);
    }

    #[test]
    fn overdue_ten_days() {
        // due 2024-01-01, returned 2024-01-11 → 10 days
        let due = parse_date("2024-01-01").unwrap();
        let ret = parse_date("2024-01-11").unwrap();
        let due_ms = day_start_millis(due, chrono_tz::UTC);
        let ret_ms = day_start_millis(ret, chrono_tz::UTC);
        assert_eq!(days_overdue(due_ms, ret_ms), 10);
    }

    #[test]
    fn parse_timezone_falls_back_to_utc() {
        assert_eq!(parse_timezone("Asia/Colombo"), chrono_tz::Asia::Colombo);
        assert_eq!(parse_timezone("Not/AZone"), chrono_tz::UTC);
    }
}
