//! Threaded comments attached to the active canvas.
//!
//! DESIGN
//! ======
//! The thread is a forest: an ordered list of top-level comments, each owning
//! its replies. Replies are attached by parent id, found with a pre-order
//! depth-first search. No back-pointers are kept.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

/// One comment and its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub date_created: String,
    #[serde(default)]
    pub replies: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

impl Comment {
    /// Build a comment with a fresh id, stamped with the current UTC time.
    pub fn new(author: impl Into<String>, text: impl Into<String>, parent_comment_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            text: text.into(),
            date_created: format_date(OffsetDateTime::now_utc()),
            replies: Vec::new(),
            parent_comment_id,
        }
    }
}

/// Render a timestamp the way comments display it: `MM/DD/YYYY, HH:MM`.
#[must_use]
pub fn format_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[month]/[day]/[year], [hour]:[minute]"))
        .unwrap_or_default()
}

/// Forest of comments for one area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentThread {
    comments: Vec<Comment>,
}

impl CommentThread {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a comment. Top-level comments are appended; replies are attached
    /// to the comment whose id equals `parent_comment_id`.
    ///
    /// Returns `false` and leaves the forest untouched when the parent cannot
    /// be found anywhere in the forest.
    pub fn add(&mut self, comment: Comment) -> bool {
        let Some(parent_id) = comment.parent_comment_id.clone() else {
            self.comments.push(comment);
            return true;
        };
        let Some(parent) = find_in_mut(&mut self.comments, &parent_id) else {
            return false;
        };
        parent.replies.push(comment);
        true
    }

    /// Find a comment anywhere in the forest.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Comment> {
        find_in(&self.comments, id)
    }

    /// Drop every comment and reply.
    pub fn clear(&mut self) {
        self.comments.clear();
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of top-level comments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Number of comments at every depth.
    #[must_use]
    pub fn total(&self) -> usize {
        fn count(comments: &[Comment]) -> usize {
            comments.iter().map(|c| 1 + count(&c.replies)).sum()
        }
        count(&self.comments)
    }
}

impl From<Vec<Comment>> for CommentThread {
    fn from(comments: Vec<Comment>) -> Self {
        Self { comments }
    }
}

impl From<CommentThread> for Vec<Comment> {
    fn from(thread: CommentThread) -> Self {
        thread.comments
    }
}

fn find_in<'a>(comments: &'a [Comment], id: &str) -> Option<&'a Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_in(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(comments: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_in_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
