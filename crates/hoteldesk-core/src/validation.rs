//! Input validation shared by registration and identity updates.

use crate::error::{DeskError, DeskResult};

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: `local@domain` with both parts non-empty and no
/// whitespace. Expects a normalized email.
pub fn validate_email(email: &str) -> DeskResult<()> {
    if email.is_empty() {
        return Err(DeskError::validation("email", "Email is required"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(DeskError::validation("email", "Email must not contain spaces"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(DeskError::validation("email", "Email address is not valid")),
    }
}

pub fn validate_password(password: &str, min_length: usize) -> DeskResult<()> {
    if password.chars().count() < min_length {
        return Err(DeskError::validation(
            "password",
            format!("Password must be at least {min_length} characters"),
        ));
    }
    Ok(())
}

/// Trim a required free-text field, rejecting blank values.
pub fn require_text(field: &str, value: &str) -> DeskResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeskError::validation(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
