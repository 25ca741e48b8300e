use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{domain::CommentId, protocol::CommentPayload};
use tracing::warn;

/// External mutation callbacks for comments. Transport and the list's
/// source of truth are the collaborator's concern; the thread only
/// delegates.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn update_comment(&self, id: CommentId, text: &str) -> Result<()>;
    async fn delete_comment(&self, id: CommentId) -> Result<()>;
}

pub struct MissingCommentStore;

#[async_trait]
impl CommentStore for MissingCommentStore {
    async fn update_comment(&self, id: CommentId, _text: &str) -> Result<()> {
        Err(anyhow!("comment store unavailable for comment {}", id.0))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<()> {
        Err(anyhow!("comment store unavailable for comment {}", id.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentMode {
    Viewing,
    Editing,
}

/// Transient unsaved edit; exists only while its comment is in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEditSession {
    pub edited_text: String,
}

/// Per-comment Viewing/Editing machine over a read-only server copy of the
/// comment list. Sessions are independent: editing one comment does not
/// cancel another, and at most one session exists per comment.
pub struct CommentThread {
    comments: Vec<CommentPayload>,
    sessions: HashMap<CommentId, CommentEditSession>,
    store: Arc<dyn CommentStore>,
}

impl CommentThread {
    pub fn new(comments: Vec<CommentPayload>, store: Arc<dyn CommentStore>) -> Self {
        Self {
            comments,
            sessions: HashMap::new(),
            store,
        }
    }

    pub fn comments(&self) -> &[CommentPayload] {
        &self.comments
    }

    fn comment(&self, id: CommentId) -> Option<&CommentPayload> {
        self.comments
            .iter()
            .find(|comment| comment.comment_id == id)
    }

    pub fn mode(&self, id: CommentId) -> CommentMode {
        if self.sessions.contains_key(&id) {
            CommentMode::Editing
        } else {
            CommentMode::Viewing
        }
    }

    /// The text a viewer sees: always the server copy. Unsaved edits live
    /// only in the session buffer.
    pub fn displayed_text(&self, id: CommentId) -> Option<&str> {
        self.comment(id).map(|comment| comment.text.as_str())
    }

    pub fn edit_buffer(&self, id: CommentId) -> Option<&str> {
        self.sessions
            .get(&id)
            .map(|session| session.edited_text.as_str())
    }

    /// Viewing -> Editing, seeding the buffer with the comment's current
    /// text. A no-op for unknown comments and for comments already in
    /// edit mode (the open session is preserved).
    pub fn begin_edit(&mut self, id: CommentId) {
        if self.sessions.contains_key(&id) {
            return;
        }
        let Some(seeded) = self.comment(id).map(|comment| comment.text.clone()) else {
            return;
        };
        self.sessions
            .insert(id, CommentEditSession { edited_text: seeded });
    }

    pub fn set_edit_buffer(&mut self, id: CommentId, text: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.edited_text = text.into();
        }
    }

    /// Editing -> Viewing, optimistically: the session is closed before
    /// the update resolves and is not reopened on failure. The store is
    /// invoked once with the buffered text.
    pub async fn save(&mut self, id: CommentId) -> Result<()> {
        let Some(session) = self.sessions.remove(&id) else {
            return Ok(());
        };
        if let Err(err) = self.store.update_comment(id, &session.edited_text).await {
            warn!(comment_id = id.0, "comment: update failed after optimistic save: {err}");
            return Err(err);
        }
        Ok(())
    }

    /// Editing -> Viewing, discarding the buffer. The displayed text is
    /// the original server copy, not the unsaved edits.
    pub fn cancel(&mut self, id: CommentId) {
        self.sessions.remove(&id);
    }

    /// Delegates deletion. The thread does not drop the comment locally;
    /// the collaborator updates the source of truth and hands back a
    /// fresh list via [`replace_comments`](Self::replace_comments).
    pub async fn delete(&mut self, id: CommentId) -> Result<()> {
        self.store.delete_comment(id).await
    }

    /// Adopts a fresh server copy. Edit sessions survive for comments
    /// that still exist; sessions for removed comments are dropped.
    pub fn replace_comments(&mut self, comments: Vec<CommentPayload>) {
        self.comments = comments;
        let live: Vec<CommentId> = self
            .comments
            .iter()
            .map(|comment| comment.comment_id)
            .collect();
        self.sessions.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
#[path = "tests/comments_tests.rs"]
mod tests;
