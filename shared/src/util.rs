/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at desk scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Member number shown on library cards: `LIB-<year>-<4 digits>`.
///
/// Uniqueness is enforced by the member registry at creation time, not
/// by this generator.
pub fn member_number(year: i32) -> String {
    use rand::Rng;
    let digits: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("LIB-{year}-{digits}")
}

/// Loan reference printed on receipts: `LOAN-<snowflake>`.
pub fn loan_reference() -> String {
    format!("LOAN-{}", snowflake_id())
}

/// Reservation reference: `RES-<snowflake>`.
pub fn reservation_reference() -> String {
    format!("RES-{}", snowflake_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_ids_fit_in_53_bits() {
        for _ in 0..100 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id < (1_i64 << 53));
        }
    }

    #[test]
    fn member_number_format() {
        let n = member_number(2026);
        assert!(n.starts_with("LIB-2026-"));
        assert_eq!(n.len(), "LIB-2026-0000".len());
    }

    #[test]
    fn references_carry_prefix() {
        assert!(loan_reference().starts_with("LOAN-"));
        assert!(reservation_reference().starts_with("RES-"));
    }
}
