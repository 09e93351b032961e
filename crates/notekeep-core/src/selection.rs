//! Tag selection for note forms.
//!
//! Selecting and creating tags are separate operations: the form searches
//! the loaded tags, and when nothing matches the caller may create a tag
//! and then toggle it into the selection.

use crate::models::Tag;

/// Tags chosen in a create or edit form, kept in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection {
    tags: Vec<Tag>,
}

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags(tags: Vec<Tag>) -> Self {
        let mut selection = Self::new();
        for tag in tags {
            if !selection.contains(&tag.id) {
                selection.tags.push(tag);
            }
        }
        selection
    }

    /// Add the tag if absent, remove it if present (matched by id).
    /// Returns true when the tag is selected afterwards.
    pub fn toggle(&mut self, tag: Tag) -> bool {
        if self.contains(&tag.id) {
            self.tags.retain(|t| t.id != tag.id);
            false
        } else {
            self.tags.push(tag);
            true
        }
    }

    pub fn contains(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }
}

/// Tags whose name contains the trimmed query, ignoring case.
/// An empty query matches everything.
pub fn search_tags<'a>(available: &'a [Tag], query: &str) -> Vec<&'a Tag> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return available.iter().collect();
    }
    available
        .iter()
        .filter(|tag| tag.name.to_lowercase().contains(&needle))
        .collect()
}
