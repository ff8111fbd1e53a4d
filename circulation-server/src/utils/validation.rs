//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits follow reasonable UX limits for names, notes and identifiers;
//! the document store has no built-in length enforcement.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: member names, book titles, organizations, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons (damage notes, waive reason, etc.)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, NIC, call numbers, member numbers, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a non-negative copy count with a sane upper bound.
pub fn validate_copy_count(value: i64, field: &str) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} must not be negative")));
    }
    if value > 10_000 {
        return Err(AppError::validation(format!(
            "{field} is unreasonably large ({value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_required_text() {
        assert!(validate_required_text("  ", "title", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("Reef Fishes", "title", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn rejects_oversized_optional_text() {
        let long = Some("x".repeat(MAX_NOTE_LEN + 1));
        assert!(validate_optional_text(&long, "notes", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&None, "notes", MAX_NOTE_LEN).is_ok());
    }

    #[test]
    fn copy_count_bounds() {
        assert!(validate_copy_count(-1, "total_copies").is_err());
        assert!(validate_copy_count(0, "total_copies").is_ok());
        assert!(validate_copy_count(10_001, "total_copies").is_err());
    }
}
