//! Username and email format checks.
//!
//! The importer only needs two yes/no answers per row, so the checks sit
//! behind [`FormatValidator`] and can be swapped out in tests.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum email length per RFC 5321.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of the part before the `@`.
const MAX_LOCAL_PART_LENGTH: usize = 64;

/// Letters and digits of any script, underscore, dot and hyphen.
static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}_.\-]+$").expect("username pattern is a valid regex")
});

/// Format checks the importer applies to usernames and emails.
pub trait FormatValidator: Send + Sync {
    fn is_valid_username(&self, uname: &str) -> bool;

    fn is_valid_email(&self, email: &str) -> bool;
}

/// The format rules used for real imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormatValidator;

impl FormatValidator for StandardFormatValidator {
    fn is_valid_username(&self, uname: &str) -> bool {
        USERNAME_PATTERN.is_match(uname)
    }

    fn is_valid_email(&self, email: &str) -> bool {
        match validate_email(email) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(email, reason, "Rejected email format");
                false
            }
        }
    }
}

/// Validate an email address format.
///
/// Practical checks consistent with RFC 5322 basics:
/// - exactly one `@`, non-empty local part and domain
/// - no whitespace or control characters, reasonable length
/// - local part made of atom characters with single, inner dots
/// - domain of dot-separated labels ending in an alphabetic TLD
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("email is empty");
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err("email exceeds maximum length");
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("email contains whitespace or control characters");
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("email must contain an '@'");
    };

    if domain.contains('@') {
        return Err("email must contain exactly one '@'");
    }

    validate_local_part(local)?;
    validate_domain(domain)
}

fn validate_local_part(local: &str) -> Result<(), &'static str> {
    if local.is_empty() {
        return Err("local part is empty");
    }

    if local.len() > MAX_LOCAL_PART_LENGTH {
        return Err("local part exceeds maximum length");
    }

    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err("local part has a misplaced dot");
    }

    let allowed = |c: char| c.is_alphanumeric() || c == '.' || "!#$%&'*+/=?^_`{|}~-".contains(c);
    if !local.chars().all(allowed) {
        return Err("local part contains invalid characters");
    }

    Ok(())
}

fn validate_domain(domain: &str) -> Result<(), &'static str> {
    if domain.is_empty() {
        return Err("domain is empty");
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("domain must contain at least one '.'");
    }

    for label in &labels {
        if label.is_empty() {
            return Err("domain has an empty label");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("domain label starts or ends with a hyphen");
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err("domain contains invalid characters");
        }
    }

    let tld = labels.last().copied().unwrap_or_default();
    if tld.chars().count() < 2 || !tld.chars().all(char::is_alphabetic) {
        return Err("top-level domain must be at least two letters");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        let validator = StandardFormatValidator;
        assert!(validator.is_valid_username("alice"));
        assert!(validator.is_valid_username("j.doe-2"));
        assert!(validator.is_valid_username("under_score"));
        assert!(validator.is_valid_username("józef"));
    }

    #[test]
    fn test_invalid_usernames() {
        let validator = StandardFormatValidator;
        assert!(!validator.is_valid_username(""));
        assert!(!validator.is_valid_username("john doe"));
        assert!(!validator.is_valid_username("semi;colon"));
        assert!(!validator.is_valid_username("<script>"));
        assert!(!validator.is_valid_username("a@b"));
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("o'brien@example.ie").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("notanemail").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user@@example.com").is_err());
        assert!(validate_email("us er@example.com").is_err());
        assert!(validate_email("user.@example.com").is_err());
        assert!(validate_email("user@example..com").is_err());
        assert!(validate_email("user@-example.com").is_err());
        assert!(validate_email("user@example.c").is_err());
        assert!(validate_email("user@example.123").is_err());
    }

    #[test]
    fn test_email_length_limit() {
        let long_local = "a".repeat(65);
        assert!(validate_email(&format!("{long_local}@example.com")).is_err());

        let long_domain = format!("{}.com", "d".repeat(250));
        assert!(validate_email(&format!("u@{long_domain}")).is_err());
    }
}
