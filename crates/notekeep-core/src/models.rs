//! Data model for notes, tags, and their join association.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::defaults::{DRAWING_CONTENT_TYPE, DRAWING_FILE_NAME, FALLBACK_CONTENT_TYPE};
use crate::error::{Error, Result};
use crate::palette::NoteColor;

// =============================================================================
// ENTITIES
// =============================================================================

/// User-defined label, many-to-many with notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Owner, assigned by the store.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One line of a note's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A note as loaded from the store, with its tags resolved through the join
/// table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored palette value. Unknown strings are kept as-is.
    #[serde(default)]
    pub color: Option<String>,
    /// Public reference to the attached image, if any.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub checklist: Vec<ChecklistItem>,
    /// Derived from the join table; never written through the notes table.
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Note {
    /// The palette entry for this note, falling back to the default color
    /// when the stored value is missing or not in the palette.
    pub fn palette_color(&self) -> NoteColor {
        self.color
            .as_deref()
            .and_then(NoteColor::from_value)
            .unwrap_or_default()
    }

    /// Ids of the tags currently attached to this note.
    pub fn tag_ids(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Row of the join table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteTagLink {
    #[serde(rename = "todo_id")]
    pub note_id: String,
    pub tag_id: String,
}

impl NoteTagLink {
    pub fn new(note_id: impl Into<String>, tag_id: impl Into<String>) -> Self {
        Self {
            note_id: note_id.into(),
            tag_id: tag_id.into(),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Trim a note title, rejecting titles that are empty afterwards.
pub fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Note title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trim a description; whitespace-only descriptions become `None`.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Trim a tag name, rejecting names that are empty afterwards.
pub fn normalize_tag_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Tag name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// IMAGES
// =============================================================================

/// Raw image payload awaiting upload to object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name; only its extension survives upload.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Wrap a PNG exported from the drawing canvas.
    pub fn drawing(png: Vec<u8>) -> Self {
        Self::new(DRAWING_FILE_NAME, png).with_content_type(DRAWING_CONTENT_TYPE)
    }

    /// Extension of the original file name, if it has one.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    /// Fresh storage object name: a random UUID plus the original extension.
    pub fn object_name(&self) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// Content type to send with the upload.
    pub fn resolved_content_type(&self) -> &str {
        if let Some(ct) = self.content_type.as_deref() {
            return ct;
        }
        match self
            .extension()
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => FALLBACK_CONTENT_TYPE,
        }
    }
}

// =============================================================================
// WRITE REQUESTS
// =============================================================================

/// User input for a new note. Tags are passed separately to
/// `create_note` because they live in the join table.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub description: Option<String>,
    pub color: NoteColor,
    pub checklist: Vec<ChecklistItem>,
    pub image: Option<ImageUpload>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_checklist(mut self, checklist: Vec<ChecklistItem>) -> Self {
        self.checklist = checklist;
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Insert payload for the notes table. Owner and creation time are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub description: Option<String>,
    pub color: NoteColor,
    pub image_url: Option<String>,
    pub checklist: Vec<ChecklistItem>,
}

/// Partial update of a note.
///
/// Serializes to the scalar columns that are set; `tags` is never part of the
/// row update and is applied through the join table instead. The nested
/// options on `description` and `image_url` distinguish "leave unchanged"
/// (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<ChecklistItem>>,
    #[serde(skip)]
    pub tags: Option<Vec<Tag>>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = Some(image_url);
        self
    }

    pub fn checklist(mut self, checklist: Vec<ChecklistItem>) -> Self {
        self.checklist = Some(checklist);
        self
    }

    pub fn tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// True when at least one column of the notes table would change.
    pub fn has_scalar_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.color.is_some()
            || self.image_url.is_some()
            || self.checklist.is_some()
    }

    /// Trim text fields and reject an empty title.
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(title) = self.title.take() {
            self.title = Some(normalize_title(&title)?);
        }
        if let Some(description) = self.description.take() {
            self.description = Some(normalize_description(description.as_deref()));
        }
        Ok(self)
    }

    /// Apply every set field to a local copy of the note, tags included.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(description) = &self.description {
            note.description = description.clone();
        }
        if let Some(color) = self.color {
            note.color = Some(color.value().to_string());
        }
        if let Some(image_url) = &self.image_url {
            note.image_url = image_url.clone();
        }
        if let Some(checklist) = &self.checklist {
            note.checklist = checklist.clone();
        }
        if let Some(tags) = &self.tags {
            note.tags = tags.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        Note {
            id: "n1".to_string(),
            title: "Groceries".to_string(),
            description: Some("for the weekend".to_string()),
            color: Some("#ffffff".to_string()),
            image_url: None,
            checklist: vec![],
            tags: vec![],
            created_at: Utc::now(),
            user_id: Some("u1".to_string()),
        }
    }

    #[test]
    fn test_note_deserializes_null_checklist() {
        let json = r##"{
            "id": "n1",
            "title": "t",
            "description": null,
            "color": "#f28b82",
            "image_url": null,
            "checklist": null,
            "created_at": "2025-01-01T00:00:00Z",
            "user_id": "u1"
        }"##;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.checklist.is_empty());
        assert!(note.tags.is_empty());
        assert_eq!(note.palette_color(), NoteColor::Red);
    }

    #[test]
    fn test_palette_color_falls_back_to_default() {
        let mut note = sample_note();
        note.color = Some("chartreuse".to_string());
        assert_eq!(note.palette_color(), NoteColor::Default);
        note.color = None;
        assert_eq!(note.palette_color(), NoteColor::Default);
    }

    #[test]
    fn test_link_serializes_with_join_column_names() {
        let link = NoteTagLink::new("n1", "t1");
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json, serde_json::json!({"todo_id": "n1", "tag_id": "t1"}));
    }

    #[test]
    fn test_normalize_title_trims() {
        assert_eq!(normalize_title("  hello ").unwrap(), "hello");
        assert!(normalize_title("   ").unwrap_err().is_validation());
        assert!(normalize_title("").is_err());
    }

    #[test]
    fn test_normalize_description_blank_is_none() {
        assert_eq!(normalize_description(Some("  ")), None);
        assert_eq!(normalize_description(None), None);
        assert_eq!(
            normalize_description(Some(" a b ")),
            Some("a b".to_string())
        );
    }

    #[test]
    fn test_object_name_keeps_extension() {
        let upload = ImageUpload::new("holiday.photo.JPG", vec![1, 2, 3]);
        let name = upload.object_name();
        assert!(name.ends_with(".JPG"));
        let stem = name.trim_end_matches(".JPG");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_object_name_without_extension() {
        let upload = ImageUpload::new("scan", vec![]);
        assert!(Uuid::parse_str(&upload.object_name()).is_ok());
    }

    #[test]
    fn test_object_names_are_fresh() {
        let upload = ImageUpload::new("a.png", vec![]);
        assert_ne!(upload.object_name(), upload.object_name());
    }

    #[test]
    fn test_drawing_upload() {
        let upload = ImageUpload::drawing(vec![0x89, 0x50]);
        assert_eq!(upload.file_name, "drawing.png");
        assert_eq!(upload.resolved_content_type(), "image/png");
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(
            ImageUpload::new("a.JPeG", vec![]).resolved_content_type(),
            "image/jpeg"
        );
        assert_eq!(
            ImageUpload::new("a.bin", vec![]).resolved_content_type(),
            "application/octet-stream"
        );
        assert_eq!(
            ImageUpload::new("a.bin", vec![])
                .with_content_type("image/heic")
                .resolved_content_type(),
            "image/heic"
        );
    }

    #[test]
    fn test_patch_serializes_only_scalar_fields_that_are_set() {
        let patch = NotePatch::new()
            .title("New")
            .image_url(None)
            .tags(vec![Tag {
                id: "t1".to_string(),
                name: "work".to_string(),
                user_id: None,
            }]);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"title": "New", "image_url": null}));
        assert!(patch.has_scalar_changes());
    }

    #[test]
    fn test_tags_only_patch_has_no_scalar_changes() {
        let patch = NotePatch::new().tags(vec![]);
        assert!(!patch.has_scalar_changes());
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_patch_normalized() {
        let patch = NotePatch::new()
            .title("  Trip ")
            .description(Some("   ".to_string()))
            .normalized()
            .unwrap();
        assert_eq!(patch.title.as_deref(), Some("Trip"));
        assert_eq!(patch.description, Some(None));

        let err = NotePatch::new().title(" ").normalized().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_patch_apply_to() {
        let mut note = sample_note();
        let tag = Tag {
            id: "t9".to_string(),
            name: "home".to_string(),
            user_id: None,
        };
        NotePatch::new()
            .description(None)
            .color(NoteColor::Yellow)
            .image_url(Some("https://cdn/x.png".to_string()))
            .tags(vec![tag.clone()])
            .apply_to(&mut note);

        assert_eq!(note.title, "Groceries");
        assert_eq!(note.description, None);
        assert_eq!(note.color.as_deref(), Some("#fff475"));
        assert_eq!(note.image_url.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(note.tags, vec![tag]);
    }
}
