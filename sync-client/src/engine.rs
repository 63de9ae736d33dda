//! TodoEngine - the offline-first reconciliation engine.
//!
//! This module provides [`TodoEngine`], the single owner of the local
//! snapshot, the pending operation queue and the replay journal.
//!
//! # Architecture
//!
//! The engine uses pure logic from sync-core (compaction, replay bookkeeping,
//! view selection) and interprets it against three collaborators:
//!
//! ```text
//! Application → TodoEngine → RemoteStore → Backend
//!                   ↓    ↘
//!              LocalStore  SyncReporter
//! ```
//!
//! Every action is applied to the visible list at once. When the device is
//! online and nothing is queued, the action goes straight to the remote
//! store; otherwise (or if that call fails) it is queued and replayed later
//! by [`TodoEngine::sync_pending_changes`].
//!
//! # Example
//!
//! ```ignore
//! use sync_client::{EngineConfig, MemoryStore, MockRemote, StatusTracker, TodoEngine};
//!
//! let engine = TodoEngine::new(MockRemote::new(), MemoryStore::new(), StatusTracker::new(), EngineConfig::default());
//! engine.hydrate().await;
//! let id = engine.add(draft).await?;
//! engine.toggle(&id).await?;
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use sync_core::{
    select_view, CallResult, OperationQueue, RemoteCall, ReplayJournal, ReplaySession,
    ReplayStep, TodoList,
};
use sync_types::{now_millis, PendingOperation, TodoDraft, TodoEdit, TodoId, TodoItem};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::connectivity::ConnectivitySignal;
use crate::error::EngineError;
use crate::remote::{RemoteError, RemoteStore};
use crate::reporter::SyncReporter;
use crate::storage::{
    LocalStore, KEY_AUTO_SYNC, KEY_LOCAL_TODOS, KEY_PENDING_OPS, KEY_REPLAY_JOURNAL,
};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Auto-sync preference used until a persisted one is loaded.
    pub auto_sync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { auto_sync: true }
    }
}

/// Why a sync request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Local state has not been loaded yet.
    NotHydrated,
    /// The device is offline.
    Offline,
    /// Another pass is running.
    AlreadySyncing,
    /// The queue is empty.
    NothingPending,
}

/// Result of [`TodoEngine::sync_pending_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// Every captured operation reached the remote store.
    Synced {
        /// Remote calls made by this pass.
        replayed: usize,
    },
    /// The pass aborted. Queue and snapshot are unchanged.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

struct EngineState {
    snapshot: TodoList,
    queue: OperationQueue,
    journal: ReplayJournal,
    remote: Option<TodoList>,
    online: bool,
    hydrated: bool,
    syncing: bool,
    captured: usize,
    auto_sync: bool,
}

impl EngineState {
    /// Leading queue entries that may already be on the remote.
    fn sealed(&self) -> usize {
        if self.syncing {
            self.captured
        } else {
            self.journal.applied
        }
    }

    fn visible(&self) -> &[TodoItem] {
        select_view(
            &self.snapshot,
            self.remote.as_ref().map(|list| list.items()),
            self.online,
            !self.queue.is_empty(),
        )
    }

    fn is_visible(&self, id: &TodoId) -> bool {
        self.visible().iter().any(|item| item.id == *id)
    }

    fn auto_sync_due(&self) -> bool {
        self.hydrated && self.online && self.auto_sync && !self.syncing && !self.queue.is_empty()
    }

    /// Adopt the cached remote list if nothing local could be overwritten.
    fn adopt_remote(&mut self) -> bool {
        if !(self.online && self.hydrated && self.queue.is_empty() && !self.syncing) {
            return false;
        }
        match &self.remote {
            Some(remote) => {
                self.snapshot = remote.clone();
                true
            }
            None => false,
        }
    }
}

enum Route {
    Direct { report: bool },
    Queued,
}

enum Mutation {
    Add { local_id: TodoId, draft: TodoDraft },
    Update(TodoEdit),
    Toggle(TodoId),
    Delete(TodoId),
}

/// The offline-first todo engine.
///
/// Build one per application and share it behind an [`Arc`].
pub struct TodoEngine<R, S, P> {
    remote: R,
    store: S,
    reporter: P,
    state: Mutex<EngineState>,
    persist_lock: Mutex<()>,
    sync_trigger: Notify,
}

impl<R: RemoteStore, S: LocalStore, P: SyncReporter> TodoEngine<R, S, P> {
    /// Create an engine. Call [`TodoEngine::hydrate`] before any action.
    pub fn new(remote: R, store: S, reporter: P, config: EngineConfig) -> Self {
        Self {
            remote,
            store,
            reporter,
            state: Mutex::new(EngineState {
                snapshot: TodoList::new(),
                queue: OperationQueue::new(),
                journal: ReplayJournal::default(),
                remote: None,
                online: true,
                hydrated: false,
                syncing: false,
                captured: 0,
                auto_sync: config.auto_sync,
            }),
            persist_lock: Mutex::new(()),
            sync_trigger: Notify::new(),
        }
    }

    /// The local store backing this engine.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The status reporter.
    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    // =========================================================================
    // Hydration and persistence
    // =========================================================================

    /// Load snapshot, queue, journal and the auto-sync preference.
    ///
    /// Missing or unreadable values fall back to empty.
    pub async fn hydrate(&self) {
        let todos: Vec<TodoItem> = self.load(KEY_LOCAL_TODOS).await.unwrap_or_default();
        let ops: Vec<PendingOperation> = self.load(KEY_PENDING_OPS).await.unwrap_or_default();
        let mut journal: ReplayJournal = self.load(KEY_REPLAY_JOURNAL).await.unwrap_or_default();
        let auto_sync = self.load_auto_sync().await;

        if journal.applied > ops.len() {
            tracing::warn!(
                "Replay journal claims {} applied of {} queued operations; discarding",
                journal.applied,
                ops.len()
            );
            journal = ReplayJournal::default();
        }

        let (adopted, due) = {
            let mut state = self.state.lock().await;
            state.snapshot = TodoList::from_items(todos);
            state.queue = OperationQueue::from_ops(ops);
            state.journal = journal;
            if let Some(enabled) = auto_sync {
                state.auto_sync = enabled;
            }
            state.hydrated = true;
            tracing::info!(
                "Hydrated {} todos and {} pending operations",
                state.snapshot.len(),
                state.queue.len()
            );
            (state.adopt_remote(), state.auto_sync_due())
        };

        if adopted {
            self.persist().await;
        }
        if due {
            self.request_sync();
        }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding corrupt value under {}: {}", key, e);
                None
            }
        }
    }

    async fn load_auto_sync(&self) -> Option<bool> {
        match self.store.get(KEY_AUTO_SYNC).await {
            Ok(Some(raw)) => match raw.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                other => {
                    tracing::warn!("Ignoring auto-sync preference {:?}", other);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", KEY_AUTO_SYNC, e);
                None
            }
        }
    }

    /// Write snapshot, queue and journal.
    ///
    /// Writers are serialized and each one reads the state after taking the
    /// lock, so the last write always carries the newest state.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let (todos, ops, journal) = {
            let state = self.state.lock().await;
            let journal = if state.journal.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&state.journal))
            };
            (
                serde_json::to_string(state.snapshot.items()),
                PendingOperation::encode_all(state.queue.ops()),
                journal,
            )
        };

        match todos {
            Ok(json) => self.write(KEY_LOCAL_TODOS, &json).await,
            Err(e) => tracing::warn!("Failed to encode todos: {}", e),
        }
        match ops {
            Ok(json) => self.write(KEY_PENDING_OPS, &json).await,
            Err(e) => tracing::warn!("Failed to encode pending operations: {}", e),
        }
        match journal {
            Some(Ok(json)) => self.write(KEY_REPLAY_JOURNAL, &json).await,
            Some(Err(e)) => tracing::warn!("Failed to encode replay journal: {}", e),
            None => {
                if let Err(e) = self.store.remove(KEY_REPLAY_JOURNAL).await {
                    tracing::warn!("Failed to clear replay journal: {}", e);
                }
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value).await {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Create a todo. Returns its id: a server id if the remote accepted it
    /// directly, a local id if it was queued.
    pub async fn add(&self, draft: TodoDraft) -> Result<TodoId, EngineError> {
        if let Route::Direct { report } = self.route(None).await? {
            if report {
                self.reporter.start();
            }
            match self.remote.add(&draft).await {
                Ok(id) => {
                    if report {
                        self.reporter.finish();
                    }
                    tracing::debug!("Added {} directly", id);
                    let item = TodoItem::from_draft(id.clone(), now_millis(), &draft);
                    self.echo(|list| list.add(item.clone())).await;
                    return Ok(id);
                }
                Err(e) => tracing::warn!("Remote add failed, queueing: {}", e),
            }
        }

        let local_id = TodoId::new_local();
        self.queue_mutation(Mutation::Add {
            local_id: local_id.clone(),
            draft,
        })
        .await;
        Ok(local_id)
    }

    /// Edit text, category and priority of a todo.
    pub async fn update(&self, edit: TodoEdit) -> Result<(), EngineError> {
        if let Route::Direct { report } = self.route(Some(&edit.id)).await? {
            if report {
                self.reporter.start();
            }
            match self.remote.update(&edit).await {
                Ok(()) => {
                    if report {
                        self.reporter.finish();
                    }
                    self.echo(|list| {
                        list.update(&edit);
                    })
                    .await;
                    return Ok(());
                }
                Err(e) => tracing::warn!("Remote update of {} failed, queueing: {}", edit.id, e),
            }
        }

        self.queue_mutation(Mutation::Update(edit)).await;
        Ok(())
    }

    /// Flip completion of a todo.
    pub async fn toggle(&self, id: &TodoId) -> Result<(), EngineError> {
        if let Route::Direct { report } = self.route(Some(id)).await? {
            if report {
                self.reporter.start();
            }
            match self.remote.toggle(id).await {
                Ok(()) => {
                    if report {
                        self.reporter.finish();
                    }
                    self.echo(|list| {
                        list.toggle(id);
                    })
                    .await;
                    return Ok(());
                }
                Err(e) => tracing::warn!("Remote toggle of {} failed, queueing: {}", id, e),
            }
        }

        self.queue_mutation(Mutation::Toggle(id.clone())).await;
        Ok(())
    }

    /// Delete a todo.
    pub async fn delete(&self, id: &TodoId) -> Result<(), EngineError> {
        if let Route::Direct { report } = self.route(Some(id)).await? {
            if report {
                self.reporter.start();
            }
            match self.remote.delete(id).await {
                Ok(()) => {
                    if report {
                        self.reporter.finish();
                    }
                    self.echo(|list| {
                        list.delete(id);
                    })
                    .await;
                    return Ok(());
                }
                Err(e) => tracing::warn!("Remote delete of {} failed, queueing: {}", id, e),
            }
        }

        self.queue_mutation(Mutation::Delete(id.clone())).await;
        Ok(())
    }

    async fn route(&self, target: Option<&TodoId>) -> Result<Route, EngineError> {
        let state = self.state.lock().await;
        if !state.hydrated {
            return Err(EngineError::NotHydrated);
        }
        if let Some(id) = target {
            if !state.is_visible(id) {
                return Err(EngineError::UnknownTodo(id.clone()));
            }
        }
        if state.online && state.queue.is_empty() && !state.syncing {
            Ok(Route::Direct {
                report: state.auto_sync,
            })
        } else {
            Ok(Route::Queued)
        }
    }

    /// Reflect a change the remote accepted in both the snapshot and the
    /// cached remote list.
    async fn echo<F: Fn(&mut TodoList)>(&self, apply: F) {
        {
            let mut state = self.state.lock().await;
            apply(&mut state.snapshot);
            if let Some(remote) = state.remote.as_mut() {
                apply(remote);
            }
        }
        self.persist().await;
    }

    async fn queue_mutation(&self, mutation: Mutation) {
        let due = {
            let mut state = self.state.lock().await;
            let sealed = state.sealed();
            match mutation {
                Mutation::Add { local_id, draft } => {
                    let item = TodoItem::from_draft(local_id.clone(), now_millis(), &draft);
                    state.snapshot.add(item);
                    state.queue.push_add(local_id, &draft);
                }
                Mutation::Update(edit) => {
                    state.snapshot.update(&edit);
                    state.queue.push_update(sealed, &edit);
                }
                Mutation::Toggle(id) => {
                    state.snapshot.toggle(&id);
                    state.queue.push_toggle(sealed, &id);
                }
                Mutation::Delete(id) => {
                    state.snapshot.delete(&id);
                    state.queue.push_delete(sealed, &id);
                }
            }
            tracing::debug!("Queued change; {} pending", state.queue.len());
            state.auto_sync_due()
        };

        self.persist().await;
        self.reporter.error();
        if due {
            self.request_sync();
        }
    }

    // =========================================================================
    // Replay
    // =========================================================================

    /// Replay the pending queue against the remote store.
    ///
    /// Operations are sent in order. On full success they are removed from
    /// the queue and local ids in the snapshot become server ids. On any
    /// failure the queue and snapshot stay as they were and progress is kept
    /// in the replay journal, so the next pass continues where this one
    /// stopped.
    pub async fn sync_pending_changes(&self) -> SyncOutcome {
        let (ops, journal) = {
            let mut state = self.state.lock().await;
            if !state.hydrated {
                return SyncOutcome::Skipped(SkipReason::NotHydrated);
            }
            if !state.online {
                return SyncOutcome::Skipped(SkipReason::Offline);
            }
            if state.syncing {
                return SyncOutcome::Skipped(SkipReason::AlreadySyncing);
            }
            if state.queue.is_empty() {
                return SyncOutcome::Skipped(SkipReason::NothingPending);
            }
            state.syncing = true;
            state.captured = state.queue.len();
            (state.queue.ops().to_vec(), state.journal.clone())
        };

        self.reporter.start();
        tracing::info!(
            "Replaying {} pending operations (resuming at {})",
            ops.len(),
            journal.applied
        );

        let mut session = ReplaySession::resume(ops, &journal);
        match self.drive(&mut session).await {
            Ok(()) => self.commit(session).await,
            Err(error) => self.abort(&session, error).await,
        }
    }

    async fn drive(&self, session: &mut ReplaySession) -> Result<(), String> {
        loop {
            match session.next_step() {
                ReplayStep::Done => return Ok(()),
                ReplayStep::Skipped { kind, id } => {
                    tracing::debug!("Skipping {} for {}: no server id", kind, id);
                }
                ReplayStep::Call(call) => {
                    let result = self.perform(&call).await.map_err(|e| e.to_string())?;
                    session.complete(result).map_err(|e| e.to_string())?;
                }
            }
            {
                let mut state = self.state.lock().await;
                state.journal = session.journal().clone();
            }
            self.persist().await;
        }
    }

    async fn perform(&self, call: &RemoteCall) -> Result<CallResult, RemoteError> {
        match call {
            RemoteCall::Add { local_id, draft } => {
                let id = self.remote.add(draft).await?;
                tracing::debug!("Replayed add {} as {}", local_id, id);
                Ok(CallResult::Added(id))
            }
            RemoteCall::Update { edit } => {
                self.remote.update(edit).await?;
                Ok(CallResult::Done)
            }
            RemoteCall::Toggle { id } => {
                self.remote.toggle(id).await?;
                Ok(CallResult::Done)
            }
            RemoteCall::Delete { id } => {
                self.remote.delete(id).await?;
                Ok(CallResult::Done)
            }
        }
    }

    async fn commit(&self, session: ReplaySession) -> SyncOutcome {
        let outcome = match session.finish() {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut state = self.state.lock().await;
                state.syncing = false;
                state.captured = 0;
                drop(state);
                self.reporter.error();
                return SyncOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let due = {
            let mut state = self.state.lock().await;
            state
                .queue
                .commit_replayed(outcome.consumed, |id| outcome.id_map.get(id));
            state.snapshot.rename_ids(&outcome.id_map);
            state.snapshot.remove_ids(&outcome.deleted);
            state.journal = ReplayJournal::default();
            // Replayed changes are not in the cached list yet.
            state.remote = None;
            state.syncing = false;
            state.captured = 0;
            tracing::info!(
                "Sync complete: {} remote calls, {} still pending",
                outcome.replayed,
                state.queue.len()
            );
            // Actions queued during the pass need another one.
            state.auto_sync_due()
        };

        self.persist().await;
        self.reporter.finish();
        self.refresh_remote().await;
        if due {
            self.request_sync();
        }

        SyncOutcome::Synced {
            replayed: outcome.replayed,
        }
    }

    async fn abort(&self, session: &ReplaySession, error: String) -> SyncOutcome {
        {
            let mut state = self.state.lock().await;
            state.journal = session.journal().clone();
            state.syncing = false;
            state.captured = 0;
        }
        tracing::warn!(
            "Sync failed after {} of {} operations: {}",
            session.journal().applied,
            session.total(),
            error
        );
        self.persist().await;
        self.reporter.error();
        SyncOutcome::Failed { error }
    }

    // =========================================================================
    // Remote list and connectivity
    // =========================================================================

    /// Record the latest remote list (`None` while it is still loading).
    ///
    /// The list replaces the local snapshot only when online, hydrated and
    /// nothing is pending. Otherwise it is cached and never touches the
    /// snapshot.
    pub async fn apply_remote_list(&self, list: Option<Vec<TodoItem>>) {
        let adopted = {
            let mut state = self.state.lock().await;
            state.remote = list.map(TodoList::from_items);
            state.adopt_remote()
        };
        if adopted {
            self.persist().await;
        }
    }

    /// Fetch the remote list and apply it. Failures are logged and ignored.
    pub async fn refresh_remote(&self) {
        match self.remote.list().await {
            Ok(list) => self.apply_remote_list(list).await,
            Err(e) => tracing::warn!("Failed to fetch remote list: {}", e),
        }
    }

    /// Record connectivity. Going online requests an auto-sync.
    pub async fn set_online(&self, online: bool) {
        let due = {
            let mut state = self.state.lock().await;
            let was_online = state.online;
            state.online = online;
            !was_online && online && state.auto_sync_due()
        };
        tracing::debug!("Connectivity: {}", if online { "online" } else { "offline" });
        if due {
            self.request_sync();
        }
    }

    /// Enable or disable automatic replay. The choice is persisted.
    pub async fn set_auto_sync(&self, enabled: bool) {
        let due = {
            let mut state = self.state.lock().await;
            state.auto_sync = enabled;
            state.auto_sync_due()
        };
        self.write(KEY_AUTO_SYNC, if enabled { "true" } else { "false" })
            .await;
        if due {
            self.request_sync();
        }
    }

    fn request_sync(&self) {
        self.sync_trigger.notify_one();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The list to show: the remote list when online, nothing is pending and
    /// it has loaded, the local snapshot otherwise.
    pub async fn todos(&self) -> Vec<TodoItem> {
        self.state.lock().await.visible().to_vec()
    }

    /// True until there is something meaningful to show.
    pub async fn is_initial_loading(&self) -> bool {
        let state = self.state.lock().await;
        !state.hydrated || (state.online && state.remote.is_none() && state.snapshot.is_empty())
    }

    /// True when operations are queued.
    pub async fn has_pending_changes(&self) -> bool {
        !self.state.lock().await.queue.is_empty()
    }

    /// Queued operations in replay order.
    pub async fn pending_operations(&self) -> Vec<PendingOperation> {
        self.state.lock().await.queue.ops().to_vec()
    }

    /// True while a replay pass runs.
    pub async fn is_syncing(&self) -> bool {
        self.state.lock().await.syncing
    }

    /// Last recorded connectivity.
    pub async fn is_online(&self) -> bool {
        self.state.lock().await.online
    }

    /// Current auto-sync preference.
    pub async fn auto_sync_enabled(&self) -> bool {
        self.state.lock().await.auto_sync
    }

    /// True once local state has been loaded.
    pub async fn is_hydrated(&self) -> bool {
        self.state.lock().await.hydrated
    }

    /// True when an automatic replay should run now.
    pub async fn auto_sync_due(&self) -> bool {
        self.state.lock().await.auto_sync_due()
    }
}

impl<R, S, P> TodoEngine<R, S, P>
where
    R: RemoteStore + 'static,
    S: LocalStore + 'static,
    P: SyncReporter + 'static,
{
    /// Follow `signal` and replay automatically whenever it is due.
    ///
    /// Runs until every handle to `signal` is dropped.
    pub async fn run_auto_sync(self: Arc<Self>, signal: ConnectivitySignal) {
        let mut rx = signal.subscribe();
        drop(signal);

        let initial = *rx.borrow_and_update();
        self.set_online(initial).await;
        if initial {
            self.refresh_remote().await;
        }

        loop {
            let mut went_online = false;
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Connectivity signal closed; stopping auto-sync");
                        return;
                    }
                    let online = *rx.borrow_and_update();
                    self.set_online(online).await;
                    went_online = online;
                }
                _ = self.sync_trigger.notified() => {}
            }

            if went_online {
                self.refresh_remote().await;
            }
            if self.auto_sync_due().await {
                let outcome = self.sync_pending_changes().await;
                tracing::debug!("Auto-sync: {:?}", outcome);
            }
        }
    }

    /// Spawn [`TodoEngine::run_auto_sync`] on the current runtime.
    pub fn spawn_auto_sync(self: &Arc<Self>, signal: ConnectivitySignal) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run_auto_sync(signal))
    }
}
