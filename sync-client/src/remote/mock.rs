//! Mock remote store for testing.
//!
//! Keeps records in memory, logs every applied call and can be told to fail.

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sync_types::{now_millis, TodoDraft, TodoEdit, TodoId, TodoItem};

/// A call that reached the mock and was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `add` with this text, answered with `id`.
    Add {
        /// Text of the created record.
        text: String,
        /// Id handed out.
        id: TodoId,
    },
    /// `update` of a record.
    Update {
        /// Target record.
        id: TodoId,
    },
    /// `toggle` of a record.
    Toggle {
        /// Target record.
        id: TodoId,
    },
    /// `delete` of a record.
    Delete {
        /// Target record.
        id: TodoId,
    },
}

/// In-memory remote store.
///
/// Clones share state, so a test can keep a handle for assertions while the
/// engine owns another.
#[derive(Debug, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    items: Vec<TodoItem>,
    next_id: u64,
    calls: Vec<MockCall>,
    attempts: usize,
    unavailable: bool,
    loading: bool,
    fail_next: Option<String>,
    fail_after: Option<usize>,
}

impl MockRemoteInner {
    /// Shared failure checks for every mutating call.
    fn check(&mut self) -> Result<(), RemoteError> {
        self.attempts += 1;
        if self.unavailable {
            return Err(RemoteError::Unavailable("remote offline".into()));
        }
        if let Some(reason) = self.fail_next.take() {
            return Err(RemoteError::Unavailable(reason));
        }
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                Err(RemoteError::Unavailable("injected failure".into()))
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn find_mut(&mut self, id: &TodoId) -> Result<&mut TodoItem, RemoteError> {
        self.items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

impl MockRemote {
    /// Create an empty, reachable remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records currently stored, newest first.
    pub fn items(&self) -> Vec<TodoItem> {
        let inner = self.inner.lock().unwrap();
        inner.items.clone()
    }

    /// Seed a record directly, bypassing the call log.
    pub fn seed(&self, item: TodoItem) {
        let mut inner = self.inner.lock().unwrap();
        inner.items.insert(0, item);
    }

    /// Calls applied so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Number of mutating calls attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.attempts
    }

    /// Make every call fail with `Unavailable` until turned off.
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.unavailable = unavailable;
    }

    /// Make `list()` return `None` until turned off.
    pub fn set_loading(&self, loading: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.loading = loading;
    }

    /// Cause the next mutating call to fail with the given reason.
    pub fn fail_next(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(reason.to_string());
    }

    /// Let the next `successes` mutating calls through, then fail one.
    pub fn fail_after(&self, successes: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_after = Some(successes);
    }
}

impl Clone for MockRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn add(&self, draft: &TodoDraft) -> Result<TodoId, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;

        if draft.text.trim().is_empty() {
            return Err(RemoteError::Rejected("text must not be empty".into()));
        }

        inner.next_id += 1;
        let id = TodoId::server(format!("server-{}", inner.next_id));
        let item = TodoItem::from_draft(id.clone(), now_millis(), draft);
        inner.items.insert(0, item);
        inner.calls.push(MockCall::Add {
            text: draft.text.clone(),
            id: id.clone(),
        });
        Ok(id)
    }

    async fn update(&self, edit: &TodoEdit) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        inner
            .find_mut(&edit.id)?
            .apply_edit(&edit.text, &edit.category, edit.priority);
        inner.calls.push(MockCall::Update {
            id: edit.id.clone(),
        });
        Ok(())
    }

    async fn toggle(&self, id: &TodoId) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        let item = inner.find_mut(id)?;
        item.is_completed = !item.is_completed;
        inner.calls.push(MockCall::Toggle { id: id.clone() });
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        let before = inner.items.len();
        inner.items.retain(|item| item.id != *id);
        if inner.items.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        inner.calls.push(MockCall::Delete { id: id.clone() });
        Ok(())
    }

    async fn list(&self) -> Result<Option<Vec<TodoItem>>, RemoteError> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(RemoteError::Unavailable("remote offline".into()));
        }
        if inner.loading {
            return Ok(None);
        }
        Ok(Some(inner.items.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::Priority;

    fn draft(text: &str) -> TodoDraft {
        TodoDraft::new(text, "General", Priority::Low).unwrap()
    }

    // ===========================================
    // MockRemote Basic Tests
    // ===========================================

    #[tokio::test]
    async fn add_assigns_sequential_server_ids() {
        let remote = MockRemote::new();
        let a = remote.add(&draft("a")).await.unwrap();
        let b = remote.add(&draft("b")).await.unwrap();
        assert_eq!(a.as_str(), "server-1");
        assert_eq!(b.as_str(), "server-2");
        assert!(!a.is_local());

        let items = remote.list().await.unwrap().unwrap();
        assert_eq!(items[0].text, "b");
    }

    #[tokio::test]
    async fn toggle_update_delete_apply() {
        let remote = MockRemote::new();
        let id = remote.add(&draft("a")).await.unwrap();
        remote.toggle(&id).await.unwrap();
        remote
            .update(&TodoEdit::new(id.clone(), "b", "Work", Priority::High).unwrap())
            .await
            .unwrap();

        let item = remote.items().into_iter().next().unwrap();
        assert!(item.is_completed);
        assert_eq!(item.text, "b");

        remote.delete(&id).await.unwrap();
        assert!(remote.items().is_empty());
        assert_eq!(remote.calls().len(), 4);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let remote = MockRemote::new();
        let err = remote.toggle(&TodoId::server("nope")).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }

    // ===========================================
    // Failure Injection Tests
    // ===========================================

    #[tokio::test]
    async fn fail_after_lets_successes_through() {
        let remote = MockRemote::new();
        remote.fail_after(2);
        remote.add(&draft("1")).await.unwrap();
        remote.add(&draft("2")).await.unwrap();
        assert!(remote.add(&draft("3")).await.is_err());
        remote.add(&draft("4")).await.unwrap();
        assert_eq!(remote.calls().len(), 3);
        assert_eq!(remote.attempts(), 4);
    }

    #[tokio::test]
    async fn unavailable_fails_everything() {
        let remote = MockRemote::new();
        remote.set_unavailable(true);
        assert!(remote.add(&draft("x")).await.is_err());
        assert!(remote.list().await.is_err());
    }

    #[tokio::test]
    async fn loading_list_is_none() {
        let remote = MockRemote::new();
        remote.set_loading(true);
        assert!(remote.list().await.unwrap().is_none());
    }
}
