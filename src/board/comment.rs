//! Comment model for AIZEVA.
//!
//! Comments nest at most two levels: a top-level comment on a post, and
//! replies to a top-level comment. A reply is never a parent.

use crate::auth::Authored;

/// Position of a comment in its post's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// Attached directly to the post.
    TopLevel,
    /// Reply to the top-level comment `parent_id`.
    Reply {
        /// Parent comment ID.
        parent_id: i64,
    },
}

impl CommentKind {
    /// Build from a nullable parent column.
    pub fn from_parent(parent_id: Option<i64>) -> Self {
        match parent_id {
            Some(parent_id) => CommentKind::Reply { parent_id },
            None => CommentKind::TopLevel,
        }
    }

    /// Parent ID, if this is a reply.
    pub fn parent_id(&self) -> Option<i64> {
        match self {
            CommentKind::TopLevel => None,
            CommentKind::Reply { parent_id } => Some(*parent_id),
        }
    }
}

/// Comment entity, joined with its author's public name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID.
    pub id: i64,
    /// ID of the post.
    pub post_id: i64,
    /// ID of the author.
    pub author_id: String,
    /// Author's username.
    pub author_username: String,
    /// Author's display name, if set.
    pub author_display_name: Option<String>,
    /// Parent comment, None for top-level comments.
    pub parent_id: Option<i64>,
    /// Sanitized body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl Comment {
    /// Position of this comment in the tree.
    pub fn kind(&self) -> CommentKind {
        CommentKind::from_parent(self.parent_id)
    }

    /// Check if this comment can take replies.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Authored for Comment {
    fn author_id(&self) -> &str {
        &self.author_id
    }
}

/// A top-level comment with its replies, both in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    /// The top-level comment.
    pub comment: Comment,
    /// Replies to it.
    pub replies: Vec<Comment>,
}

impl CommentThread {
    /// Group a post's comments (in creation order) into threads.
    ///
    /// Replies whose parent is missing from `comments` are dropped.
    pub fn build(comments: Vec<Comment>) -> Vec<CommentThread> {
        let (top_level, replies): (Vec<_>, Vec<_>) =
            comments.into_iter().partition(Comment::is_top_level);

        let mut threads: Vec<CommentThread> = top_level
            .into_iter()
            .map(|comment| CommentThread {
                comment,
                replies: Vec::new(),
            })
            .collect();

        for reply in replies {
            if let Some(thread) = threads
                .iter_mut()
                .find(|t| Some(t.comment.id) == reply.parent_id)
            {
                thread.replies.push(reply);
            }
        }
        threads
    }
}

/// Data for creating a new comment. The body is stored as given.
#[derive(Debug, Clone)]
pub struct NewComment {
    /// ID of the post.
    pub post_id: i64,
    /// ID of the author.
    pub author_id: String,
    /// Tree position.
    pub kind: CommentKind,
    /// Body.
    pub body: String,
}

impl NewComment {
    /// Create a new top-level comment.
    pub fn new(post_id: i64, author_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            post_id,
            author_id: author_id.into(),
            kind: CommentKind::TopLevel,
            body: body.into(),
        }
    }

    /// Make this a reply to `parent_id`.
    pub fn reply_to(mut self, parent_id: i64) -> Self {
        self.kind = CommentKind::Reply { parent_id };
        self
    }
}
