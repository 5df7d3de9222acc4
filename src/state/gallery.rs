/// Ordered gallery with a current selection
///
/// Both the panorama list and the world list are held newest-first, with
/// at most one item selected as "current". All mutators keep the
/// selection pointing at an item that actually exists in the list.
use crate::api::models::{GeneratedImage, World3D};

/// Anything a gallery can hold: identified by an opaque server id
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for GeneratedImage {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for World3D {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Newest-first list of gallery items plus the current selection
#[derive(Debug, Clone)]
pub struct Gallery<T> {
    items: Vec<T>,
    current: Option<String>,
}

impl<T> Default for Gallery<T> {
    fn default() -> Self {
        Self { items: Vec::new(), current: None }
    }
}

impl<T: Keyed> Gallery<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The currently selected item, if any
    pub fn current(&self) -> Option<&T> {
        let id = self.current.as_deref()?;
        self.items.iter().find(|item| item.key() == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
    }

    /// Replace the whole list (gallery fetch)
    ///
    /// The first item becomes current if nothing was selected; a selection
    /// that no longer exists also falls back to the first item.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;

        let still_there = self
            .current
            .as_deref()
            .is_some_and(|id| self.items.iter().any(|item| item.key() == id));

        if !still_there {
            self.current = self.items.first().map(|item| item.key().to_string());
        }
    }

    /// Insert a fresh item at the front and select it
    pub fn prepend_and_select(&mut self, item: T) {
        self.current = Some(item.key().to_string());
        self.items.insert(0, item);
    }

    /// Add an item fetched out-of-band to the end and select it
    ///
    /// Used when a referenced item was not part of the listed set, so
    /// the newest-first ordering of the fetched list is preserved.
    pub fn adopt_and_select(&mut self, item: T) {
        let id = item.key().to_string();
        if !self.items.iter().any(|existing| existing.key() == id) {
            self.items.push(item);
        }
        self.current = Some(id);
    }

    /// Select an existing item; unknown ids leave the selection alone
    pub fn select(&mut self, id: &str) -> bool {
        if self.items.iter().any(|item| item.key() == id) {
            self.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Remove an item by id, fixing up the selection
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == id)?;
        let removed = self.items.remove(index);

        if self.current.as_deref() == Some(id) {
            self.current = self.items.first().map(|item| item.key().to_string());
        }

        Some(removed)
    }

    /// Keep only items matching the predicate, fixing up the selection
    pub fn retain(&mut self, keep: impl Fn(&T) -> bool) {
        self.items.retain(|item| keep(item));

        let still_there = self
            .current
            .as_deref()
            .is_some_and(|id| self.items.iter().any(|item| item.key() == id));

        if !still_there {
            self.current = self.items.first().map(|item| item.key().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> GeneratedImage {
        GeneratedImage {
            id: id.to_string(),
            prompt: format!("prompt for {id}"),
            image_url: format!("/images/{id}.png"),
            created_at: "2024-07-31T15:42:12".to_string(),
            scenario: "beach".to_string(),
        }
    }

    #[test]
    fn test_empty_gallery_has_no_current() {
        let gallery: Gallery<GeneratedImage> = Gallery::new();
        assert!(gallery.is_empty());
        assert!(gallery.current().is_none());
    }

    #[test]
    fn test_replace_all_promotes_first_item() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b")]);

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.current().unwrap().id, "a");
    }

    #[test]
    fn test_replace_all_keeps_existing_selection() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b")]);
        gallery.select("b");

        gallery.replace_all(vec![image("c"), image("b"), image("a")]);

        assert_eq!(gallery.current().unwrap().id, "b");
    }

    #[test]
    fn test_prepend_inserts_at_front_and_selects() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("old")]);

        gallery.prepend_and_select(image("new"));

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.items()[0].id, "new");
        assert_eq!(gallery.current().unwrap().id, "new");
    }

    #[test]
    fn test_adopt_appends_and_selects() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b")]);

        gallery.adopt_and_select(image("old"));

        assert_eq!(gallery.items()[2].id, "old");
        assert_eq!(gallery.current().unwrap().id, "old");

        // Adopting a known id only moves the selection
        gallery.adopt_and_select(image("a"));
        assert_eq!(gallery.len(), 3);
        assert_eq!(gallery.current().unwrap().id, "a");
    }

    #[test]
    fn test_select_unknown_id_is_ignored() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a")]);

        assert!(!gallery.select("ghost"));
        assert_eq!(gallery.current().unwrap().id, "a");
    }

    #[test]
    fn test_remove_current_falls_back_to_first() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b"), image("c")]);
        gallery.select("b");

        let removed = gallery.remove("b").unwrap();

        assert_eq!(removed.id, "b");
        assert_eq!(gallery.current().unwrap().id, "a");
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b")]);
        gallery.select("b");

        gallery.remove("a");

        assert_eq!(gallery.current().unwrap().id, "b");
    }

    #[test]
    fn test_remove_last_item_empties_selection() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a")]);

        gallery.remove("a");

        assert!(gallery.is_empty());
        assert!(gallery.current().is_none());
    }

    #[test]
    fn test_retain_fixes_up_selection() {
        let mut gallery = Gallery::new();
        gallery.replace_all(vec![image("a"), image("b"), image("c")]);
        gallery.select("b");

        gallery.retain(|item| item.id != "b");

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.current().unwrap().id, "a");
    }
}
