//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Minimum number of characters in an accepted check-in submission
pub const MIN_CONTENT_CHARS: usize = 100;

/// Validate a student id
///
/// Student ids are exactly 12 digits.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Student id is required".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]{12}$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Student id must be exactly 12 digits".to_string());
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Maximum length of a profile field, matching the VARCHAR(64) columns;
/// anything longer must fail here as a validation error, not at the insert
pub const MAX_FIELD_CHARS: usize = 64;

/// Validate a required profile field (name, department, contact)
pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(format!(
            "{} must be at most {} characters long",
            label, MAX_FIELD_CHARS
        ));
    }

    Ok(())
}

/// Validate check-in submission content
///
/// The content is trimmed first; the minimum length counts characters, not
/// bytes, so multi-byte scripts are not penalized.
pub fn validate_content(content: &str) -> Result<(), String> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err("Content must not be empty".to_string());
    }

    if trimmed.chars().count() < MIN_CONTENT_CHARS {
        return Err(format!(
            "Content must be at least {} characters long",
            MIN_CONTENT_CHARS
        ));
    }

    Ok(())
}
