//! Extra utilities for use elsewhere in the API.

use std::sync::OnceLock;

use regex::Regex;
use time::{OffsetDateTime, UtcOffset};

use crate::error::{AgendaError, AgendaResult};

pub fn current_time(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

pub fn ensure_valid_email(email: &str) -> AgendaResult<()> {
    if email_pattern().is_match(email) {
        Ok(())
    } else {
        Err(AgendaError::bad_request(format!(
            "{} is not a valid email address",
            email
        )))
    }
}

/// Trims a required text field, rejecting it if nothing is left.
pub fn required(field: &str, value: &str) -> AgendaResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AgendaError::bad_request(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Trims an optional text field, treating blank values as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(ensure_valid_email("visitor@example.org").is_ok());
        assert!(ensure_valid_email("no-at-sign.org").is_err());
        assert!(ensure_valid_email("two@@example.org").is_err());
        assert!(ensure_valid_email("spaces in@example.org").is_err());
    }

    #[test]
    fn text_fields_are_trimmed() {
        assert_eq!(required("Title", "  Cleanup ").unwrap(), "Cleanup");
        assert!(matches!(
            required("Title", "   "),
            Err(AgendaError::BadRequest(_))
        ));
        assert_eq!(optional(Some("  ".to_owned())), None);
        assert_eq!(optional(Some(" Park ".to_owned())), Some("Park".to_owned()));
        assert_eq!(optional(None), None);
    }
}
