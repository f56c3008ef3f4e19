//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{DomainError, DomainResult};

const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 100;

/// Validate email
pub fn validate_email(email: &str) -> DomainResult<()> {
    if email.is_empty() {
        return Err(invalid("Email is required"));
    }

    if email.len() > 254 {
        return Err(invalid("Email must be at most 254 characters long"));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(invalid("Invalid email format"));
    }

    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> DomainResult<()> {
    let len = password.chars().count();

    if len == 0 {
        return Err(invalid("Password is required"));
    }

    if len < PASSWORD_MIN_LEN {
        return Err(invalid(&format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_LEN
        )));
    }

    if len > PASSWORD_MAX_LEN {
        return Err(invalid(&format!(
            "Password must be at most {} characters long",
            PASSWORD_MAX_LEN
        )));
    }

    Ok(())
}

fn invalid(message: &str) -> DomainError {
    DomainError::Validation(message.to_string())
}
