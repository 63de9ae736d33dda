//! Sync status reporting.
//!
//! The engine tells a [`SyncReporter`] when remote work starts, finishes or
//! fails. [`StatusTracker`] turns those calls into a user-visible status by
//! driving the pure machine from `sync-core` and running its revert timers
//! on tokio.

use std::sync::{Arc, Mutex};
use sync_core::{StatusAction, StatusEvent, SyncPhase, SyncStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receives sync lifecycle notifications from the engine.
///
/// Calls are synchronous and must not block.
pub trait SyncReporter: Send + Sync {
    /// Remote work started.
    fn start(&self);
    /// Remote work succeeded.
    fn finish(&self);
    /// Remote work failed, or a change was queued for later.
    fn error(&self);
}

impl<T: SyncReporter + ?Sized> SyncReporter for Arc<T> {
    fn start(&self) {
        (**self).start()
    }

    fn finish(&self) {
        (**self).finish()
    }

    fn error(&self) {
        (**self).error()
    }
}

/// Status published by [`StatusTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatusView {
    /// Current phase.
    pub phase: SyncPhase,
    /// True after a failure until the next start or success.
    pub has_unsynced_changes: bool,
}

impl From<SyncStatus> for SyncStatusView {
    fn from(status: SyncStatus) -> Self {
        Self {
            phase: status.phase,
            has_unsynced_changes: status.has_unsynced_changes,
        }
    }
}

/// Reporter that maintains a [`SyncStatusView`].
///
/// `Synced` reverts to `Idle` after 2 seconds and `Error` after 3 seconds.
/// Clones share state.
#[derive(Clone)]
pub struct StatusTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    status: Mutex<SyncStatus>,
    timer: Mutex<Option<JoinHandle<()>>>,
    tx: watch::Sender<SyncStatusView>,
}

impl StatusTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncStatusView::default());
        Self {
            inner: Arc::new(TrackerInner {
                status: Mutex::new(SyncStatus::new()),
                timer: Mutex::new(None),
                tx,
            }),
        }
    }

    /// Current status.
    pub fn current(&self) -> SyncStatusView {
        *self.inner.tx.borrow()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatusView> {
        self.inner.tx.subscribe()
    }

    fn handle(&self, event: StatusEvent) {
        let actions = {
            let mut status = match self.inner.status.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let (next, actions) = status.on_event(event);
            *status = next;
            actions
        };

        for action in actions {
            match action {
                StatusAction::Emit(status) => {
                    self.inner.tx.send_replace(status.into());
                }
                StatusAction::CancelRevertTimer => self.cancel_timer(),
                StatusAction::StartRevertTimer { delay, generation } => {
                    self.start_timer(delay, generation)
                }
            }
        }
    }

    fn cancel_timer(&self) {
        let mut timer = match self.inner.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }

    fn start_timer(&self, delay: std::time::Duration, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No tokio runtime; status will not revert to idle");
            return;
        };
        self.cancel_timer();
        let tracker = self.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tracker.handle(StatusEvent::RevertTimer { generation });
        });
        let mut timer = match self.inner.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *timer = Some(handle);
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReporter for StatusTracker {
    fn start(&self) {
        self.handle(StatusEvent::Start);
    }

    fn finish(&self) {
        self.handle(StatusEvent::Finish);
    }

    fn error(&self) {
        self.handle(StatusEvent::Fail);
    }
}

/// A call received by [`RecordingReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedEvent {
    /// `start()`
    Start,
    /// `finish()`
    Finish,
    /// `error()`
    Error,
}

/// Reporter that only records calls (for testing).
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportedEvent>>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: ReportedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SyncReporter for RecordingReporter {
    fn start(&self) {
        self.push(ReportedEvent::Start);
    }

    fn finish(&self) {
        self.push(ReportedEvent::Finish);
    }

    fn error(&self) {
        self.push(ReportedEvent::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn finish_reverts_to_idle() {
        let tracker = StatusTracker::new();
        tracker.start();
        assert_eq!(tracker.current().phase, SyncPhase::Syncing);

        tracker.finish();
        assert_eq!(tracker.current().phase, SyncPhase::Synced);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(tracker.current().phase, SyncPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn error_reverts_after_three_seconds_and_keeps_unsynced() {
        let tracker = StatusTracker::new();
        tracker.error();
        assert_eq!(tracker.current().phase, SyncPhase::Error);
        assert!(tracker.current().has_unsynced_changes);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(tracker.current().phase, SyncPhase::Error);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(tracker.current().phase, SyncPhase::Idle);
        assert!(tracker.current().has_unsynced_changes);
    }

    #[tokio::test(start_paused = true)]
    async fn start_cancels_pending_revert() {
        let tracker = StatusTracker::new();
        tracker.error();
        tracker.start();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tracker.current().phase, SyncPhase::Syncing);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let tracker = StatusTracker::new();
        let mut rx = tracker.subscribe();
        tracker.start();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase, SyncPhase::Syncing);
    }

    #[test]
    fn recording_reporter_records_in_order() {
        let reporter = RecordingReporter::new();
        let handle = reporter.clone();
        reporter.start();
        reporter.error();
        assert_eq!(
            handle.events(),
            vec![ReportedEvent::Start, ReportedEvent::Error]
        );
    }
}
