//! The local snapshot of todo items and the rule that picks what is shown.

use std::collections::BTreeMap;

use sync_types::{TodoEdit, TodoId, TodoItem};

/// Ordered list of todo items kept on the device, newest first.
///
/// All mutations are optimistic: they apply immediately and report whether
/// the target item was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap items loaded from persistence or received from the remote.
    pub fn from_items(items: Vec<TodoItem>) -> Self {
        Self { items }
    }

    /// Items in display order.
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Insert a new item at the front.
    pub fn add(&mut self, item: TodoItem) {
        self.items.insert(0, item);
    }

    /// Apply an edit. Returns false if the item is unknown.
    pub fn update(&mut self, edit: &TodoEdit) -> bool {
        match self.items.iter_mut().find(|item| item.id == edit.id) {
            Some(item) => {
                item.apply_edit(&edit.text, &edit.category, edit.priority);
                true
            }
            None => false,
        }
    }

    /// Flip completion. Returns false if the item is unknown.
    pub fn toggle(&mut self, id: &TodoId) -> bool {
        match self.items.iter_mut().find(|item| item.id == *id) {
            Some(item) => {
                item.is_completed = !item.is_completed;
                true
            }
            None => false,
        }
    }

    /// Remove an item. Returns false if the item is unknown.
    pub fn delete(&mut self, id: &TodoId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        self.items.len() != before
    }

    /// Replace local ids with the server ids assigned during replay.
    pub fn rename_ids(&mut self, id_map: &BTreeMap<TodoId, TodoId>) {
        for item in &mut self.items {
            if let Some(server_id) = id_map.get(&item.id) {
                item.id = server_id.clone();
            }
        }
    }

    /// Drop every item whose id is listed.
    pub fn remove_ids(&mut self, ids: &[TodoId]) {
        if ids.is_empty() {
            return;
        }
        self.items.retain(|item| !ids.contains(&item.id));
    }
}

/// Pick the list shown to the user.
///
/// The remote list is shown only when online, nothing is pending and the
/// remote list has loaded. Otherwise the local snapshot is shown. The two are
/// never blended.
pub fn select_view<'a>(
    local: &'a TodoList,
    remote: Option<&'a [TodoItem]>,
    online: bool,
    has_pending: bool,
) -> &'a [TodoItem] {
    match remote {
        Some(remote) if online && !has_pending => remote,
        _ => local.items(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::Priority;

    fn item(id: &str, text: &str) -> TodoItem {
        TodoItem {
            id: TodoId::from(id),
            created_at: 1,
            text: text.into(),
            is_completed: false,
            category: None,
            priority: None,
        }
    }

    #[test]
    fn add_puts_newest_first() {
        let mut list = TodoList::new();
        list.add(item("a", "first"));
        list.add(item("b", "second"));
        assert_eq!(list.items()[0].id.as_str(), "b");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn update_and_toggle_report_missing_items() {
        let mut list = TodoList::from_items(vec![item("a", "x")]);
        let edit = TodoEdit::new(TodoId::from("a"), "y", "Home", Priority::Low).unwrap();
        assert!(list.update(&edit));
        assert_eq!(list.get(&TodoId::from("a")).unwrap().text, "y");

        assert!(list.toggle(&TodoId::from("a")));
        assert!(list.get(&TodoId::from("a")).unwrap().is_completed);

        assert!(!list.toggle(&TodoId::from("zzz")));
        assert!(!list.delete(&TodoId::from("zzz")));
    }

    #[test]
    fn rename_then_remove() {
        let mut list = TodoList::from_items(vec![
            item("local:1:aaaaaa", "a"),
            item("server-2", "b"),
        ]);
        let map: BTreeMap<TodoId, TodoId> =
            [(TodoId::from("local:1:aaaaaa"), TodoId::server("server-1"))]
                .into_iter()
                .collect();
        list.rename_ids(&map);
        assert!(list.get(&TodoId::from("server-1")).is_some());

        list.remove_ids(&[TodoId::from("server-2")]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn view_prefers_remote_only_when_safe() {
        let local = TodoList::from_items(vec![item("local:1:aaaaaa", "local")]);
        let remote = vec![item("server-1", "remote")];

        let shown = select_view(&local, Some(remote.as_slice()), true, false);
        assert_eq!(shown[0].text, "remote");

        assert_eq!(select_view(&local, Some(remote.as_slice()), false, false)[0].text, "local");
        assert_eq!(select_view(&local, Some(remote.as_slice()), true, true)[0].text, "local");
        assert_eq!(select_view(&local, None, true, false)[0].text, "local");
    }
}
