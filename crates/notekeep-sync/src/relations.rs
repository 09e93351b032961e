//! Note/tag association management over the join table.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use notekeep_core::{NoteTagLink, NoteTagRepository, Result, Tag};

/// Replaces a note's tag set through the join table.
///
/// The replace is delete-all-then-insert, not a diff, and the two calls are
/// not atomic: a failure between them leaves the note with no tags. Running
/// the same replace again converges to the target set.
#[derive(Clone)]
pub struct RelationSynchronizer {
    note_tags: Arc<dyn NoteTagRepository>,
}

impl RelationSynchronizer {
    pub fn new(note_tags: Arc<dyn NoteTagRepository>) -> Self {
        Self { note_tags }
    }

    /// Make the join rows for `note_id` exactly `tags`.
    #[instrument(skip(self, tags), fields(subsystem = "sync", component = "relations", op = "replace", tag_count = tags.len()))]
    pub async fn replace(&self, note_id: &str, tags: &[Tag]) -> Result<()> {
        self.note_tags.delete_for_note(note_id).await?;
        self.attach(note_id, tags).await
    }

    /// Insert join rows for `tags` in one batch without touching existing
    /// rows. No request is made for an empty set.
    pub async fn attach(&self, note_id: &str, tags: &[Tag]) -> Result<()> {
        let links = links_for(note_id, tags);
        if links.is_empty() {
            return Ok(());
        }

        debug!(note_id, row_count = links.len(), "Linking tags");
        self.note_tags.insert_links(&links).await
    }
}

/// One join row per distinct tag id, in first-seen order.
pub fn links_for(note_id: &str, tags: &[Tag]) -> Vec<NoteTagLink> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .map(|t| NoteTagLink::new(note_id, t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: &str) -> Tag {
        Tag {
            id: id.to_string(),
            name: format!("tag-{}", id),
            user_id: None,
        }
    }

    #[test]
    fn test_links_for_collapses_duplicates() {
        let links = links_for("n1", &[tag("a"), tag("b"), tag("a")]);
        assert_eq!(
            links,
            vec![NoteTagLink::new("n1", "a"), NoteTagLink::new("n1", "b")]
        );
    }

    #[test]
    fn test_links_for_empty() {
        assert!(links_for("n1", &[]).is_empty());
    }
}
