//! Validation and scheduling arithmetic for connection reminders.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum length of the free-text note attached to a connection.
pub const MAX_NOTE_LEN: usize = 200;

/// Maximum remind-after delay: one year.
pub const MAX_REMIND_HOURS: i64 = 24 * 365;

/// Validate the remind-after delay in whole hours.
pub fn validate_remind_hours(hours: i64) -> Result<(), CoreError> {
    if hours < 1 {
        return Err(CoreError::Validation(
            "Remind delay must be at least one hour".to_string(),
        ));
    }
    if hours > MAX_REMIND_HOURS {
        return Err(CoreError::Validation(format!(
            "Remind delay must not exceed {MAX_REMIND_HOURS} hours"
        )));
    }
    Ok(())
}

/// Validate an optional free-text note.
pub fn validate_note(note: Option<&str>) -> Result<(), CoreError> {
    if let Some(note) = note {
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(CoreError::Validation(format!(
                "Note must not exceed {MAX_NOTE_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Compute the reminder instant from the creation time and a validated
/// whole-hour delay.
pub fn remind_at_from_hours(now: Timestamp, hours: i64) -> Timestamp {
    now + Duration::hours(hours)
}

/// Sanity-check a reminder recipient address. Full RFC validation is the
/// mail provider's job; this only rejects obviously broken input early.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(CoreError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

/// Normalize a scanned LinkedIn profile URL: trim whitespace and strip the
/// query string (QR scans append tracking parameters).
pub fn normalize_profile_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Profile URL must not be empty".to_string(),
        ));
    }
    let clean = trimmed.split('?').next().unwrap_or(trimmed);
    if !clean.starts_with("https://") && !clean.starts_with("http://") {
        return Err(CoreError::Validation(
            "Profile URL must be an http(s) URL".to_string(),
        ));
    }
    Ok(clean.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn remind_hours_must_be_positive() {
        assert!(validate_remind_hours(0).is_err());
        assert!(validate_remind_hours(-5).is_err());
        assert!(validate_remind_hours(1).is_ok());
    }

    #[test]
    fn remind_hours_bounded_by_one_year() {
        assert!(validate_remind_hours(MAX_REMIND_HOURS).is_ok());
        assert!(validate_remind_hours(MAX_REMIND_HOURS + 1).is_err());
    }

    #[test]
    fn note_at_limit_is_accepted() {
        let note = "x".repeat(MAX_NOTE_LEN);
        assert!(validate_note(Some(&note)).is_ok());
    }

    #[test]
    fn note_over_limit_is_rejected() {
        let note = "x".repeat(MAX_NOTE_LEN + 1);
        assert!(validate_note(Some(&note)).is_err());
    }

    #[test]
    fn missing_note_is_accepted() {
        assert!(validate_note(None).is_ok());
    }

    #[test]
    fn remind_at_adds_whole_hours() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        assert_eq!(remind_at_from_hours(now, 24), expected);
    }

    #[test]
    fn plausible_email_is_accepted() {
        assert!(validate_email("user@example.com").is_ok());
    }

    #[test]
    fn broken_emails_are_rejected() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn profile_url_query_string_is_stripped() {
        let url = "https://www.linkedin.com/in/someone?trk=qr_scan&foo=bar";
        assert_eq!(
            normalize_profile_url(url).unwrap(),
            "https://www.linkedin.com/in/someone"
        );
    }

    #[test]
    fn profile_url_without_query_is_unchanged() {
        let url = "https://www.linkedin.com/in/someone";
        assert_eq!(normalize_profile_url(url).unwrap(), url);
    }

    #[test]
    fn profile_url_is_trimmed() {
        assert_eq!(
            normalize_profile_url("  https://www.linkedin.com/in/a \n").unwrap(),
            "https://www.linkedin.com/in/a"
        );
    }

    #[test]
    fn empty_profile_url_is_rejected() {
        assert!(normalize_profile_url("   ").is_err());
    }

    #[test]
    fn non_http_profile_url_is_rejected() {
        assert!(normalize_profile_url("ftp://example.com/in/a").is_err());
    }
}
