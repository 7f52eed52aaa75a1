//! Syntax checks for the sign-up and claim forms.
//!
//! Every validator is single pass and returns the first rule that fails. The
//! `Display` of [`ValidationError`] is the exact message shown next to the
//! form field, so callers can surface `err.to_string()` as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Alphanumeric first and last character, hyphen and underscore allowed in between.
static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*[A-Za-z0-9]$").expect("valid username regex"));
static SHORT_USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]$").expect("valid short username regex"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is required")]
    UsernameRequired,
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("Username must be less than {max} characters")]
    UsernameTooLong { max: usize },
    #[error("Username can only contain letters and numbers")]
    UsernameNotAlphanumeric,
    #[error("Username can only contain letters, numbers, hyphens, and underscores")]
    UsernameInvalidCharacters,

    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,

    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,
    #[error("Password must contain at least one number")]
    PasswordMissingDigit,

    #[error("Please confirm your password")]
    ConfirmPasswordRequired,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        use ValidationError::*;
        match self {
            UsernameRequired
            | UsernameTooShort { .. }
            | UsernameTooLong { .. }
            | UsernameNotAlphanumeric
            | UsernameInvalidCharacters => "username",
            EmailRequired | EmailInvalid => "email",
            PasswordRequired
            | PasswordTooShort { .. }
            | PasswordMissingUppercase
            | PasswordMissingLowercase
            | PasswordMissingDigit => "password",
            ConfirmPasswordRequired | PasswordMismatch => "confirm_password",
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Checks the format of a username exactly as typed (no trimming except for the
/// "required" rule). Length is counted in characters.
pub fn validate_username(raw: &str) -> ValidationResult {
    if raw.trim().is_empty() {
        return Err(ValidationError::UsernameRequired);
    }

    let len = raw.chars().count();
    if len < USERNAME_MIN_LENGTH {
        return Err(ValidationError::UsernameTooShort { min: USERNAME_MIN_LENGTH });
    }
    if len > USERNAME_MAX_LENGTH {
        return Err(ValidationError::UsernameTooLong { max: USERNAME_MAX_LENGTH });
    }

    // Only reachable if the minimum length is ever lowered below 3.
    if len <= 2 {
        if !SHORT_USERNAME_PATTERN.is_match(raw) {
            return Err(ValidationError::UsernameNotAlphanumeric);
        }
    } else if !USERNAME_PATTERN.is_match(raw) {
        return Err(ValidationError::UsernameInvalidCharacters);
    }

    Ok(())
}

/// Lookup key for case-insensitive comparisons against taken and reserved names.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(raw: &str) -> ValidationResult {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::PasswordTooShort { min: PASSWORD_MIN_LENGTH });
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    Ok(())
}

pub fn validate_confirm_password(password: &str, confirm: &str) -> ValidationResult {
    if confirm.is_empty() {
        return Err(ValidationError::ConfirmPasswordRequired);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// A username that passed [`validate_username`]. Keeps the form the user typed;
/// use [`Username::normalized`] for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_username(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn normalized(&self) -> String {
        normalize_username(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
