//! Circulation actions (借阅业务)
//!
//! 每个桌面操作 (借出/归还/续借/预约...) 是一个函数，校验与多文档
//! 写入在同一个 SurrealDB 事务里完成：前置条件不满足时 THROW，
//! 整个事务回滚，不会留下半套写入。
//!
//! 记录引用 (member/book) 统一以 "table:id" 字符串落库；事务内需要
//! 改写被引用文档时，另行绑定解析好的 RecordId。

pub mod checkin;
pub mod checkout;
pub mod expiry;
pub mod fine_math;
pub mod fines;
pub mod renew;
pub mod reserve;

pub use checkin::{CheckinRequest, checkin};
pub use checkout::{CheckoutRequest, checkout};
pub use expiry::ReservationExpirySweeper;
pub use fines::{pay_fine, waive_fine};
pub use renew::renew;
pub use reserve::{cancel_reservation, collect_reservation, mark_reservation_ready, reserve};

use crate::utils::AppError;

/// 事务内 THROW 的错误码 → 对外业务错误
///
/// 码格式 `<action>:<reason>`，消息沿用桌面端的提示文案。
const THROWN_RULES: &[(&str, &str)] = &[
    ("checkout:member_not_active", "Member account is not active"),
    ("checkout:membership_expired", "Member membership has expired"),
    (
        "checkout:limit_reached",
        "Member has reached the maximum book limit",
    ),
    (
        "checkout:outstanding_fines",
        "Member has outstanding fines. Please clear fines before borrowing",
    ),
    ("checkout:no_copies", "No copies available for checkout"),
    ("checkin:loan_not_active", "Loan is already closed"),
    (
        "renew:limit_reached",
        "Maximum number of renewals reached for this loan",
    ),
    (
        "renew:pending_holds",
        "Book has pending reservations and cannot be renewed",
    ),
    ("reserve:member_not_active", "Member account is not active"),
    ("reserve:membership_expired", "Member membership has expired"),
    (
        "reserve:limit_reached",
        "Member has reached the maximum book limit",
    ),
    (
        "reserve:outstanding_fines",
        "Member has outstanding fines. Please clear fines before reserving",
    ),
    (
        "reserve:duplicate",
        "An open reservation already exists for this title",
    ),
    (
        "reservation:not_open",
        "Reservation is no longer pending or ready",
    ),
    ("reservation:not_pending", "Reservation is not pending"),
    ("reservation:not_ready", "Reservation is not ready for collection"),
    ("fine:already_settled", "Fine is already paid or waived"),
    ("fine:overpayment", "Payment exceeds the outstanding amount"),
];

const THROWN_NOT_FOUND: &[(&str, &str)] = &[
    ("checkout:member_not_found", "Member not found"),
    ("checkout:book_not_found", "Book not found in inventory"),
    ("checkin:loan_not_found", "No active loan found"),
    ("renew:loan_not_found", "No active loan found"),
    ("reserve:member_not_found", "Member not found"),
    ("reserve:book_not_found", "Book not found in inventory"),
    ("reservation:not_found", "Reservation not found"),
    ("fine:not_found", "Fine not found"),
];

const THROWN_CONFLICTS: &[(&str, &str)] = &[
    (
        "checkin:loan_changed",
        "Loan changed while processing the return, please retry",
    ),
    (
        "renew:loan_changed",
        "Loan changed while processing the renewal, please retry",
    ),
];

/// 在单条错误消息里找我们 THROW 的业务码
fn map_thrown(msg: &str) -> Option<AppError> {
    for (code, friendly) in THROWN_RULES {
        if msg.contains(code) {
            return Some(AppError::business_rule(*friendly));
        }
    }
    for (code, friendly) in THROWN_NOT_FOUND {
        if msg.contains(code) {
            return Some(AppError::not_found(*friendly));
        }
    }
    for (code, friendly) in THROWN_CONFLICTS {
        if msg.contains(code) {
            return Some(AppError::conflict(*friendly));
        }
    }
    None
}

/// Map a SurrealDB error (possibly a THROW from one of our transactions)
/// to the application error taxonomy.
pub(crate) fn map_db_error(err: surrealdb::Error) -> AppError {
    let msg = err.to_string();
    map_thrown(&msg).unwrap_or(AppError::Database(msg))
}

/// 检查事务执行结果。
///
/// 事务 THROW 时，之前的语句会带上 "query was not executed" 一类的
/// 占位错误 —— 必须扫描全部语句错误找出真正的业务码，不能只看第一条。
pub(crate) fn check_transaction(response: &mut surrealdb::Response) -> Result<(), AppError> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = errors.into_values().map(|e| e.to_string()).collect();
    for msg in &messages {
        if let Some(err) = map_thrown(msg) {
            return Err(err);
        }
    }
    Err(AppError::database(messages.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_codes_map_to_business_errors() {
        let err = surrealdb::Error::Api(surrealdb::error::Api::Query(
            "An error occurred: checkout:no_copies".to_string(),
        ));
        match map_db_error(err) {
            AppError::BusinessRule(msg) => {
                assert_eq!(msg, "No copies available for checkout")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_errors_stay_database_errors() {
        let err = surrealdb::Error::Api(surrealdb::error::Api::Query("boom".to_string()));
        assert!(matches!(map_db_error(err), AppError::Database(_)));
    }
}
