//! Authentication module for AIZEVA.
//!
//! This module provides password hashing, the identity provider seam,
//! process-local sessions, CSRF protection, JWT access tokens, access
//! control, and the signup/login service built on them.

pub mod csrf;
pub mod identity;
mod password;
pub mod permission;
mod service;
pub mod session;
mod token;
pub mod validation;

pub use csrf::{CsrfGuard, CSRF_FORM_FIELD, CSRF_HEADER};
pub use identity::{Identity, IdentityProvider, LocalIdentityProvider};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH, SPECIAL_CHARACTERS,
};
pub use permission::{
    can_moderate, can_write, require_admin, require_moderate, require_write, Authored,
    PermissionError,
};
pub use service::{AuthService, LoginOutcome, SignupRequest};
pub use session::{Session, SessionStore};
pub use token::{JwtClaims, TokenIssuer};
pub use validation::ValidationError;
