//! Core traits for notekeep's remote collaborators.
//!
//! The sync controller talks to the data API and the object storage only
//! through these traits, so the HTTP adapters and the in-memory mock are
//! interchangeable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DATA API
// =============================================================================

/// Access to the notes table.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Every note, newest first, each with its tags resolved through the
    /// join table.
    async fn list_with_tags(&self) -> Result<Vec<Note>>;

    /// Insert a note and return the stored row (tags empty).
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Update the scalar columns named in the patch. `patch.tags` is ignored.
    async fn update(&self, id: &str, patch: &NotePatch) -> Result<()>;

    /// Delete a note. Its join rows are expected to cascade server-side.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Access to the tags table.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Every tag ordered by name.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Insert a tag and return the stored row. Names are not deduplicated.
    async fn create(&self, name: &str) -> Result<Tag>;

    /// Rename a tag.
    async fn rename(&self, id: &str, name: &str) -> Result<()>;

    /// Delete a tag. Its join rows are expected to cascade server-side.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Access to the note/tag join table.
#[async_trait]
pub trait NoteTagRepository: Send + Sync {
    /// Delete every join row for a note.
    async fn delete_for_note(&self, note_id: &str) -> Result<()>;

    /// Insert join rows in one batch.
    async fn insert_links(&self, links: &[NoteTagLink]) -> Result<()>;
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

/// Write-only access to the image bucket.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store the bytes under `object_name` and return the public reference.
    async fn upload(&self, object_name: &str, content_type: &str, bytes: &[u8])
        -> Result<String>;
}

// =============================================================================
// BUNDLE
// =============================================================================

/// The four remote collaborators the sync controller depends on.
#[derive(Clone)]
pub struct RemoteStore {
    pub notes: Arc<dyn NoteRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub note_tags: Arc<dyn NoteTagRepository>,
    pub images: Arc<dyn ImageStorage>,
}

impl RemoteStore {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        tags: Arc<dyn TagRepository>,
        note_tags: Arc<dyn NoteTagRepository>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            notes,
            tags,
            note_tags,
            images,
        }
    }
}
