//! Work item store.
//!
//! Ordered collection of conversion jobs plus the destination template.
//! Single source of truth for item state; owned exclusively by the
//! dispatcher, which performs all status transitions. Insertion order is
//! scheduling order (oldest waiting first).

use crate::model::{Status, WorkId, WorkItem};
use crate::template;
use std::collections::BTreeSet;

/// In-memory store of work items.
#[derive(Debug, Default)]
pub struct Store {
    items: Vec<WorkItem>,
    /// Next ID to allocate. Never reset, so IDs are unique for the
    /// lifetime of the store even across `clear()`.
    next_id: u64,
    /// Destination template. `None` means "derive automatically from the
    /// first added file".
    template: Option<String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append new items with status Waiting, resolving each destination
    /// from the template. If no template is set, one is derived from the
    /// first path being added. Returns true when that default was derived.
    pub fn add(&mut self, paths: impl IntoIterator<Item = String>) -> bool {
        let paths: Vec<String> = paths.into_iter().collect();
        let Some(first) = paths.first() else {
            return false;
        };

        let derived = if self.template.is_none() {
            self.template = Some(template::default_template(first));
            true
        } else {
            false
        };

        // template is always Some past this point
        let tmpl = self.template.clone().unwrap_or_default();
        for source in paths {
            let id = WorkId(self.next_id);
            self.next_id += 1;
            let destination = template::expand(&tmpl, &source);
            self.items.push(WorkItem {
                id,
                source,
                destination,
                status: Status::Waiting,
            });
        }

        derived
    }

    /// Delete items at the given positions. Order-independent; out-of-range
    /// indices are ignored. In-flight items are removed like any other;
    /// their processes keep running and the stale completion misses the
    /// ID lookup later.
    pub fn remove(&mut self, indices: &[usize]) {
        let doomed: BTreeSet<usize> = indices.iter().copied().collect();
        let mut position = 0;
        self.items.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
    }

    /// Set every item back to Waiting, whatever its current status.
    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.status = Status::Waiting;
        }
    }

    /// Empty the collection and unset the template.
    pub fn clear(&mut self) {
        self.items.clear();
        self.template = None;
    }

    /// Replace the destination template and recompute every destination.
    /// An empty string means "derive automatically": with items present the
    /// default is re-derived from the first one, otherwise the template
    /// becomes unset.
    pub fn set_template(&mut self, tmpl: &str) {
        if tmpl.is_empty() {
            self.template = self
                .items
                .first()
                .map(|item| template::default_template(&item.source));
        } else {
            self.template = Some(tmpl.to_string());
        }

        if let Some(ref tmpl) = self.template {
            for item in &mut self.items {
                item.destination = template::expand(tmpl, &item.source);
            }
        }
    }

    /// Current template, if set.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Look up an item by ID.
    pub fn get(&self, id: WorkId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Set an item's status. Returns false when the item is gone
    /// (removed while its process was in flight).
    pub fn set_status(&mut self, id: WorkId, status: Status) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(paths: &[&str]) -> Store {
        let mut store = Store::new();
        store.add(paths.iter().map(|p| p.to_string()));
        store
    }

    #[test]
    fn add_derives_default_template_from_first_path() {
        let store = store_with(&["/pics/a.png", "/other/b.jpg"]);
        assert_eq!(store.template(), Some("/pics/%n-resized"));
        assert_eq!(store.items()[0].destination, "/pics/a-resized.png");
        // second file lands in the first file's directory, own extension kept
        assert_eq!(store.items()[1].destination, "/pics/b-resized.jpg");
    }

    #[test]
    fn add_keeps_existing_template() {
        let mut store = Store::new();
        store.set_template("%p/%n-out");
        let derived = store.add(vec!["/pics/a.png".to_string()]);
        assert!(!derived);
        assert_eq!(store.items()[0].destination, "/pics/a-out.png");
    }

    #[test]
    fn add_nothing_is_a_noop() {
        let mut store = Store::new();
        assert!(!store.add(Vec::new()));
        assert!(store.items().is_empty());
        assert_eq!(store.template(), None);
    }

    #[test]
    fn remove_handles_unordered_indices() {
        let mut store = store_with(&["/p/a.png", "/p/b.png", "/p/c.png", "/p/d.png"]);
        store.remove(&[2, 0]);
        let sources: Vec<_> = store.items().iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["/p/b.png", "/p/d.png"]);
    }

    #[test]
    fn remove_ignores_out_of_range_indices() {
        let mut store = store_with(&["/p/a.png"]);
        store.remove(&[5, 0, 99]);
        assert!(store.items().is_empty());
    }

    #[test]
    fn ids_survive_removal() {
        let mut store = store_with(&["/p/a.png", "/p/b.png", "/p/c.png"]);
        let c_id = store.items()[2].id;
        store.remove(&[0]);
        assert_eq!(store.get(c_id).unwrap().source, "/p/c.png");
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut store = store_with(&["/p/a.png"]);
        let first = store.items()[0].id;
        store.clear();
        store.add(vec!["/p/b.png".to_string()]);
        assert!(store.items()[0].id > first);
    }

    #[test]
    fn clear_unsets_template() {
        let mut store = store_with(&["/p/a.png"]);
        store.clear();
        assert_eq!(store.template(), None);
        // next add re-derives from its own first file
        store.add(vec!["/q/b.jpg".to_string()]);
        assert_eq!(store.template(), Some("/q/%n-resized"));
    }

    #[test]
    fn set_template_recomputes_destinations() {
        let mut store = store_with(&["/a/b/c.png"]);
        store.set_template("%p/%n-resized");
        assert_eq!(store.items()[0].destination, "/a/b/c-resized.png");
    }

    #[test]
    fn empty_template_rederives_default() {
        let mut store = store_with(&["/a/b/c.png"]);
        store.set_template("/elsewhere/%n");
        store.set_template("");
        assert_eq!(store.template(), Some("/a/b/%n-resized"));
        assert_eq!(store.items()[0].destination, "/a/b/c-resized.png");
    }

    #[test]
    fn reset_requeues_terminal_items() {
        let mut store = store_with(&["/p/a.png", "/p/b.png"]);
        let ids: Vec<_> = store.items().iter().map(|i| i.id).collect();
        store.set_status(ids[0], Status::Ok);
        store.set_status(
            ids[1],
            Status::Failed {
                error: "boom".to_string(),
            },
        );
        store.reset();
        assert!(store.items().iter().all(|i| i.status == Status::Waiting));
    }

    #[test]
    fn set_status_on_missing_item_returns_false() {
        let mut store = store_with(&["/p/a.png"]);
        assert!(!store.set_status(WorkId(999), Status::Ok));
    }
}
