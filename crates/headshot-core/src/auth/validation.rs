use super::{Credentials, MIN_PASSWORD_LEN};
use crate::error::{HeadshotError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid")
    })
}

/// Normalizes and checks an email address.
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email_pattern().is_match(&email) {
        Ok(email)
    } else {
        Err(HeadshotError::validation("Please enter a valid email address"))
    }
}

pub fn validate_credentials(credentials: &Credentials) -> Result<Credentials> {
    let email = validate_email(&credentials.email)?;
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(HeadshotError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(Credentials::new(email, credentials.password.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        assert_eq!(validate_email("  Jane@Example.COM ").unwrap(), "jane@example.com");
    }

    #[test]
    fn test_malformed_emails() {
        for bad in ["", "jane", "jane@", "@example.com", "jane@example", "ja ne@example.com"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_short_password() {
        let err = validate_credentials(&Credentials::new("a@b.co", "12345")).unwrap_err();
        assert!(err.is_validation());
        assert!(validate_credentials(&Credentials::new("a@b.co", "123456")).is_ok());
    }
}
