//! Input validation helpers
//!
//! Centralized text length constants and validation functions shared by the
//! typed request payloads.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Person and shop names
pub const MAX_NAME_LEN: u64 = 100;

/// Job titles, rule names
pub const MAX_TITLE_LEN: u64 = 200;

/// Notes, descriptions, reasons (reject reason, reassign reason, job notes)
pub const MAX_NOTE_LEN: u64 = 500;

/// Short identifiers: phone, VIN, vehicle make/model
pub const MAX_SHORT_TEXT_LEN: u64 = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: u64 = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: u64 = 6;
pub const MAX_PASSWORD_LEN: u64 = 128;

/// URLs / avatar paths
pub const MAX_URL_LEN: u64 = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: u64 = 500;

// ── Numeric limits ──────────────────────────────────────────────────

/// Book time and actual time, in minutes (about 69 days)
pub const MAX_JOB_MINUTES: i64 = 100_000;

/// Rule bonus per unit, in currency
pub const MAX_BONUS_PER_UNIT: f64 = 100_000.0;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
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
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Run `validator` derive rules and flatten the first failure into an [`AppError`].
pub fn validate_payload<T: validator::Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        let message = match fields.first() {
            Some(first) => format!("Invalid value for {first}"),
            None => "Invalid request payload".to_string(),
        };
        AppError::validation(message).with_detail("fields", fields)
    })
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5))]
        name: String,
        #[validate(range(min = 1))]
        book_time: i64,
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Oil Change", "title", MAX_TITLE_LEN as usize).is_ok());
        let err = validate_required_text("   ", "title", MAX_TITLE_LEN as usize).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(validate_required_text(&"x".repeat(11), "title", 10).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 3).is_ok());
        assert!(validate_optional_text(&Some("abc".into()), "notes", 3).is_ok());
        assert!(validate_optional_text(&Some("abcd".into()), "notes", 3).is_err());
    }

    #[test]
    fn test_validate_payload_reports_fields() {
        let ok = Sample { name: "abc".into(), book_time: 60 };
        assert!(validate_payload(&ok).is_ok());

        let bad = Sample { name: "abc".into(), book_time: 0 };
        let err = validate_payload(&bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Invalid value for book_time");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Tech@Shop.COM "), "tech@shop.com");
    }
}
