//! Input validation functions
//!
//! This module provides validation and normalization for signup and login
//! input. Email syntax checks are delegated to the `validator` crate.

use crate::errors::FieldErrors;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use validator::ValidateEmail;

/// Minimum password length in characters
pub const PASSWORD_MIN_LEN: usize = 6;
/// Maximum password length in characters
pub const PASSWORD_MAX_LEN: usize = 128;
/// Maximum email length in bytes
pub const EMAIL_MAX_LEN: usize = 255;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]{2,31}$").expect("valid username regex"));

/// Normalize an email, username or login identity
///
/// Identities are compared case-insensitively, so the same normalization
/// must run before every write and every lookup.
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > EMAIL_MAX_LEN {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate username format
///
/// 3 to 32 characters: ASCII letters, digits, `_`, `.` or `-`, starting
/// with a letter.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username must be 3-32 characters, start with a letter and contain only letters, digits, '_', '.' or '-'"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err("Password too long".to_string());
    }
    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err("Password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

/// Validate all signup fields at once
///
/// Every field is checked so a single response can report all problems.
/// Email and username are expected to be normalized already.
pub fn validate_signup(email: &str, username: &str, password: &str) -> Result<(), FieldErrors> {
    FieldErrors {
        email: validate_email(email).err(),
        username: validate_username(username).err(),
        password: validate_password(password).err(),
    }
    .into_result()
}
