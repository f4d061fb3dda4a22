//! AIZEVA - a multi-board community server
//!
//! Boards with per-board write tiers, posts with sanitized rich text,
//! two-level comment threads and an admin console, served as a JSON API.

pub mod admin;
pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use admin::{AdminError, RemovalOutcome};
pub use auth::{AuthService, PasswordError, PermissionError};
pub use board::{BoardService, WritePermission};
pub use config::Config;
pub use db::{Database, User};
pub use error::{AizevaError, Result};
