//! Edit-form flow for an existing note.
//!
//! A `NoteEdit` holds the whole form: every field is written back on save,
//! the tag set included, so a save always replaces the note's join rows.

use thiserror::Error;
use tracing::{instrument, warn};

use notekeep_core::{
    normalize_description, ChecklistItem, Error, ImageUpload, Note, NoteColor, NotePatch, Tag,
};

use crate::controller::SyncController;
use crate::mutation::MutationOutcome;

/// What to do with the note's image on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current reference untouched.
    #[default]
    Keep,
    /// Upload a new image and point the note at it. The old object is
    /// left in storage.
    Replace(ImageUpload),
    /// Clear the reference. The object is left in storage.
    Remove,
}

/// Editable copy of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEdit {
    pub title: String,
    pub description: String,
    pub color: NoteColor,
    pub checklist: Vec<ChecklistItem>,
    pub tags: Vec<Tag>,
    pub image: ImageChange,
}

impl NoteEdit {
    /// Seed the form from a loaded note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            description: note.description.clone().unwrap_or_default(),
            color: note.palette_color(),
            checklist: note.checklist.clone(),
            tags: note.tags.clone(),
            image: ImageChange::Keep,
        }
    }

    /// Full patch for this form, given the resolved image reference change.
    fn into_patch(self, image_url: Option<Option<String>>) -> NotePatch {
        let mut patch = NotePatch::new()
            .title(self.title)
            .description(normalize_description(Some(&self.description)))
            .color(self.color)
            .checklist(self.checklist)
            .tags(self.tags);
        patch.image_url = image_url;
        patch
    }
}

/// Save failure carrying a message for inline display. The form stays open
/// and the save can be retried.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EditError {
    pub message: String,
    #[source]
    pub source: Error,
}

impl EditError {
    fn new(context: &str, source: Error) -> Self {
        let message = match &source {
            Error::InvalidInput(msg) => msg.clone(),
            other => format!("{}: {}", context, other),
        };
        Self { message, source }
    }

    /// True when the form was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        self.source.is_validation()
    }
}

impl SyncController {
    /// Save an edit form: upload a replacement image if any, then update the
    /// note with every field, tags included.
    ///
    /// `Err` means nothing was saved and the form should stay open. `Ok` with
    /// `partial_failure` set means the fields were saved but the tag set was
    /// not; the message is meant for inline display next to the tag picker.
    #[instrument(skip(self, edit), fields(subsystem = "sync", component = "edit", op = "save_edit"))]
    pub async fn save_edit(
        &self,
        id: &str,
        edit: NoteEdit,
    ) -> std::result::Result<MutationOutcome<()>, EditError> {
        if edit.title.trim().is_empty() {
            return Err(EditError::new(
                "Invalid note",
                Error::InvalidInput("Note title cannot be empty".to_string()),
            ));
        }

        let image_url = match &edit.image {
            ImageChange::Keep => None,
            ImageChange::Remove => Some(None),
            ImageChange::Replace(upload) => {
                let object_name = upload.object_name();
                let url = self
                    .upload_image(&object_name, upload)
                    .await
                    .map_err(|e| {
                        warn!(note_id = id, error = %e, "Image upload failed, edit not saved");
                        EditError::new("Failed to upload image", e)
                    })?;
                Some(Some(url))
            }
        };

        let patch = edit.into_patch(image_url);
        self.update_note(id, patch)
            .await
            .map_err(|e| EditError::new("Failed to save note", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note() -> Note {
        Note {
            id: "n1".to_string(),
            title: "Trip".to_string(),
            description: None,
            color: Some("not-a-color".to_string()),
            image_url: Some("https://cdn/a.png".to_string()),
            checklist: vec![],
            tags: vec![Tag {
                id: "t1".to_string(),
                name: "travel".to_string(),
                user_id: None,
            }],
            created_at: Utc::now(),
            user_id: Some("u1".to_string()),
        }
    }

    #[test]
    fn test_from_note_seeds_form() {
        let edit = NoteEdit::from_note(&note());
        assert_eq!(edit.title, "Trip");
        assert_eq!(edit.description, "");
        assert_eq!(edit.color, NoteColor::Default);
        assert_eq!(edit.tags.len(), 1);
        assert_eq!(edit.image, ImageChange::Keep);
    }

    #[test]
    fn test_into_patch_clears_blank_description() {
        let mut edit = NoteEdit::from_note(&note());
        edit.description = "   ".to_string();
        let patch = edit.into_patch(None);
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.image_url, None);
        assert!(patch.tags.is_some());
    }

    #[test]
    fn test_validation_message_is_displayable() {
        let err = EditError::new(
            "Invalid note",
            Error::InvalidInput("Note title cannot be empty".to_string()),
        );
        assert_eq!(err.to_string(), "Note title cannot be empty");
        assert!(err.is_validation());

        let err = EditError::new(
            "Failed to save note",
            Error::Remote {
                status: 500,
                message: "oops".to_string(),
            },
        );
        assert!(err.message.starts_with("Failed to save note"));
        assert!(!err.is_validation());
    }
}
