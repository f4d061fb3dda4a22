//! Board module for AIZEVA.
//!
//! This module provides the community content:
//! - Boards with a per-board write tier
//! - Posts with sanitized bodies, view counts, search and pagination
//! - Two-level comment threads

mod comment;
mod comment_repository;
mod post;
mod post_repository;
mod repository;
pub mod sanitize;
mod service;
mod types;

pub use comment::{Comment, CommentKind, CommentThread, NewComment};
pub use comment_repository::CommentRepository;
pub use post::{LatestPost, NewPost, Post, PostUpdate};
pub use post_repository::PostRepository;
pub use repository::BoardRepository;
pub use service::{
    BoardService, PaginatedResult, PostPermissions, DEFAULT_LATEST_LIMIT, MAX_LATEST_LIMIT,
    MAX_TITLE_LENGTH, POSTS_PER_PAGE,
};
pub(crate) use service::page_offset;
pub use types::{
    validate_board_name, validate_slug, Board, BoardUpdate, BoardWithStats, NewBoard,
    UnknownWritePermission, WritePermission, MAX_BOARD_NAME_LENGTH, MAX_SLUG_LENGTH,
};
