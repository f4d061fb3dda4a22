//! Password hashing and policy checks for AIZEVA.
//!
//! Uses Argon2id for password hashing.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Characters accepted as the required special character.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{};:\"\\|,.<>?";

/// Password-related errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    /// Password contains whitespace.
    #[error("password must not contain spaces")]
    ContainsWhitespace,

    /// Password has no letter.
    #[error("password must contain at least one letter")]
    MissingLetter,

    /// Password has no digit.
    #[error("password must contain at least one digit")]
    MissingDigit,

    /// Password has no special character.
    #[error("password must contain at least one special character")]
    MissingSpecial,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Password hash is invalid.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Password verification failed (wrong password).
    #[error("password verification failed")]
    VerificationFailed,
}

/// Argon2id with 19 MiB memory, 2 iterations, 1 lane.
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(19 * 1024, 2, 1, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id.
///
/// Returns a PHC-formatted hash string that includes the salt and parameters.
/// The policy is not checked here; call [`validate_password`] first.
///
/// # Examples
///
/// ```
/// use aizeva::auth::hash_password;
///
/// let hash = hash_password("Sup3r$ecret!").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// The Argon2 parameters are read from the stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// Check a candidate password against the signup policy.
///
/// # Examples
///
/// ```
/// use aizeva::auth::validate_password;
///
/// assert!(validate_password("short1!").is_err());
/// assert!(validate_password("longenough1!").is_ok());
/// ```
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    if password.chars().any(char::is_whitespace) {
        return Err(PasswordError::ContainsWhitespace);
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(PasswordError::MissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(PasswordError::MissingSpecial);
    }
    Ok(())
}
