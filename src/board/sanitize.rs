//! HTML sanitization for user content.
//!
//! Post bodies come from a rich-text editor and keep a small formatting
//! subset plus inline images. Comment bodies keep only inline formatting.
//! Titles and previews are reduced to plain text. Every policy is
//! idempotent: cleaning already-clean output returns it unchanged.

use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};

const POST_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "u",
    "ol",
    "ul",
    "li",
    "blockquote",
    "img",
];

const COMMENT_TAGS: &[&str] = &["p", "br", "strong", "em"];

const IMG_ATTRIBUTES: &[&str] = &["src", "alt", "width", "height"];

const URL_SCHEMES: &[&str] = &["data", "http", "https"];

/// Length of the plain-text preview in characters.
pub const PREVIEW_LENGTH: usize = 100;

fn builder(tags: &[&'static str]) -> Builder<'static> {
    let mut builder = Builder::default();

    let mut tag_attributes = HashMap::new();
    if tags.contains(&"img") {
        tag_attributes.insert("img", IMG_ATTRIBUTES.iter().copied().collect());
    }

    builder
        .tags(tags.iter().copied().collect())
        .clean_content_tags(HashSet::from(["script", "style"]))
        .generic_attributes(HashSet::new())
        .tag_attributes(tag_attributes)
        .url_schemes(URL_SCHEMES.iter().copied().collect())
        .url_relative(UrlRelative::Deny)
        .link_rel(None);
    builder
}

/// Clean a post body.
pub fn sanitize_post_body(html: &str) -> String {
    builder(POST_TAGS).clean(html).to_string()
}

/// Clean a comment body.
pub fn sanitize_comment_body(html: &str) -> String {
    builder(COMMENT_TAGS).clean(html).to_string()
}

/// Strip every tag, keeping the (escaped) text.
pub fn strip_tags(html: &str) -> String {
    builder(&[]).clean(html).to_string()
}

/// Plain-text preview of a body, cut to [`PREVIEW_LENGTH`] characters.
pub fn preview(html: &str) -> String {
    let text = strip_tags(html);
    let text = text.trim();
    if text.chars().count() > PREVIEW_LENGTH {
        let cut: String = text.chars().take(PREVIEW_LENGTH).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
