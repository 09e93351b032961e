//! Checklist editing.

use uuid::Uuid;

use crate::models::ChecklistItem;

/// Ordered checklist being edited in a form.
///
/// Item ids are fresh UUIDs, so they stay unique within the list even when
/// two items carry the same text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<ChecklistItem>) -> Self {
        Self { items }
    }

    /// Append an unchecked item. Blank text is ignored and yields `None`.
    pub fn add(&mut self, text: &str) -> Option<&ChecklistItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.items.push(ChecklistItem {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
        });
        self.items.last()
    }

    /// Remove an item by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Flip an item's completed flag. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of completed items.
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    pub fn into_items(self) -> Vec<ChecklistItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_trims_and_ignores_blank() {
        let mut list = Checklist::new();
        assert!(list.add("   ").is_none());
        let item = list.add("  milk ").cloned().unwrap();
        assert_eq!(item.text, "milk");
        assert!(!item.completed);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_ids_unique_for_same_text() {
        let mut list = Checklist::new();
        list.add("eggs");
        list.add("eggs");
        assert_ne!(list.items()[0].id, list.items()[1].id);
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut list = Checklist::new();
        let id = list.add("bread").unwrap().id.clone();
        list.add("butter");

        assert_eq!(list.toggle(&id), Some(true));
        assert_eq!(list.completed_count(), 1);
        assert_eq!(list.toggle(&id), Some(false));
        assert_eq!(list.toggle("missing"), None);

        assert!(list.remove(&id));
        assert!(!list.remove(&id));
        assert_eq!(list.items()[0].text, "butter");
    }

    #[test]
    fn test_preserves_order() {
        let mut list = Checklist::new();
        for text in ["a", "b", "c"] {
            list.add(text);
        }
        let texts: Vec<_> = list.into_items().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }
}
