//! Input validation for signup.
//!
//! Usernames, display names and email addresses are checked here; password
//! policy lives in [`crate::auth::password`].

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Maximum display name length.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits and underscores")]
    UsernameInvalidChars,

    /// Display name is too long.
    #[error("display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters")]
    DisplayNameTooLong,

    /// Display name contains control characters.
    #[error("display name contains invalid characters")]
    DisplayNameInvalidChars,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Validate a username.
///
/// # Examples
///
/// ```
/// use aizeva::auth::validation::validate_username;
///
/// assert!(validate_username("john_doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate an optional display name.
pub fn validate_display_name(display_name: &str) -> Result<(), ValidationError> {
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::DisplayNameTooLong);
    }
    if display_name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::DisplayNameInvalidChars);
    }
    Ok(())
}

/// Validate an email address.
///
/// Only the shape is checked: one `@`, a non-empty local part, and a dotted
/// domain without empty labels.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(str::is_empty) {
        return Err(ValidationError::EmailInvalidFormat);
    }
    Ok(())
}
