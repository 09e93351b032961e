//! Client-side tag filtering over the loaded note list.

use crate::models::Note;

/// True if any of the note's resolved tags is named exactly `tag_name`.
pub fn note_has_tag(note: &Note, tag_name: &str) -> bool {
    note.tags.iter().any(|tag| tag.name == tag_name)
}

/// Notes matching the active tag filter, in their original order.
/// With no filter every note matches.
pub fn filter_by_tag<'a>(notes: &'a [Note], tag_name: Option<&str>) -> Vec<&'a Note> {
    match tag_name {
        Some(name) => notes.iter().filter(|n| note_has_tag(n, name)).collect(),
        None => notes.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use chrono::Utc;

    fn note_with_tags(id: &str, names: &[&str]) -> Note {
        Note {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            color: None,
            image_url: None,
            checklist: vec![],
            tags: names
                .iter()
                .enumerate()
                .map(|(i, name)| Tag {
                    id: format!("{}-t{}", id, i),
                    name: name.to_string(),
                    user_id: None,
                })
                .collect(),
            created_at: Utc::now(),
            user_id: None,
        }
    }

    #[test]
    fn test_filter_matches_exact_name() {
        let notes = vec![note_with_tags("a", &["work"]), note_with_tags("b", &["home"])];
        let hits = filter_by_tag(&notes, Some("work"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let notes = vec![note_with_tags("a", &["Work"])];
        assert!(filter_by_tag(&notes, Some("work")).is_empty());
    }

    #[test]
    fn test_no_filter_returns_all() {
        let notes = vec![note_with_tags("a", &[]), note_with_tags("b", &["x"])];
        assert_eq!(filter_by_tag(&notes, None).len(), 2);
    }

    #[test]
    fn test_any_tag_matches() {
        let note = note_with_tags("a", &["home", "urgent"]);
        assert!(note_has_tag(&note, "urgent"));
        assert!(!note_has_tag(&note, "work"));
    }
}
