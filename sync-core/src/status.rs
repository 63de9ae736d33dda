//! Sync status state machine.
//!
//! Pure and side-effect free: it takes events and returns the new state plus
//! actions to execute. Running timers and publishing the status is done by
//! `sync-client`.

use std::time::Duration;

/// How long `Synced` stays visible before reverting to `Idle`.
pub const SYNCED_REVERT_DELAY: Duration = Duration::from_secs(2);

/// How long `Error` stays visible before reverting to `Idle`.
pub const ERROR_REVERT_DELAY: Duration = Duration::from_secs(3);

/// User-visible sync phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Nothing happening.
    #[default]
    Idle,
    /// A sync is running.
    Syncing,
    /// The last sync succeeded.
    Synced,
    /// The last sync or remote call failed.
    Error,
}

impl SyncPhase {
    /// Lowercase name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Syncing => "syncing",
            SyncPhase::Synced => "synced",
            SyncPhase::Error => "error",
        }
    }
}

/// Sync status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// Current phase.
    pub phase: SyncPhase,
    /// True after a failure until the next start or success.
    pub has_unsynced_changes: bool,
    /// Generation of the latest revert timer. Older timers are ignored.
    timer_generation: u64,
}

impl SyncStatus {
    /// Create an idle status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an event and return the new status plus actions to execute.
    pub fn on_event(self, event: StatusEvent) -> (Self, Vec<StatusAction>) {
        match event {
            StatusEvent::Start => {
                let next = Self {
                    phase: SyncPhase::Syncing,
                    has_unsynced_changes: false,
                    timer_generation: self.timer_generation.wrapping_add(1),
                };
                (next, vec![StatusAction::CancelRevertTimer, StatusAction::Emit(next)])
            }
            StatusEvent::Finish => {
                let next = Self {
                    phase: SyncPhase::Synced,
                    has_unsynced_changes: false,
                    timer_generation: self.timer_generation.wrapping_add(1),
                };
                (
                    next,
                    vec![
                        StatusAction::Emit(next),
                        StatusAction::StartRevertTimer {
                            delay: SYNCED_REVERT_DELAY,
                            generation: next.timer_generation,
                        },
                    ],
                )
            }
            StatusEvent::Fail => {
                let next = Self {
                    phase: SyncPhase::Error,
                    has_unsynced_changes: true,
                    timer_generation: self.timer_generation.wrapping_add(1),
                };
                (
                    next,
                    vec![
                        StatusAction::Emit(next),
                        StatusAction::StartRevertTimer {
                            delay: ERROR_REVERT_DELAY,
                            generation: next.timer_generation,
                        },
                    ],
                )
            }
            StatusEvent::RevertTimer { generation }
                if generation == self.timer_generation
                    && matches!(self.phase, SyncPhase::Synced | SyncPhase::Error) =>
            {
                let next = Self {
                    phase: SyncPhase::Idle,
                    ..self
                };
                (next, vec![StatusAction::Emit(next)])
            }
            // Stale timer
            StatusEvent::RevertTimer { .. } => (self, vec![]),
        }
    }
}

/// Events that drive the status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// A sync or direct remote call began.
    Start,
    /// It succeeded.
    Finish,
    /// It failed, or a change was queued.
    Fail,
    /// A revert timer fired.
    RevertTimer {
        /// Generation the timer was started with.
        generation: u64,
    },
}

/// Actions for `sync-client` to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// Publish the status.
    Emit(SyncStatus),
    /// Schedule a [`StatusEvent::RevertTimer`] after `delay`.
    StartRevertTimer {
        /// Delay before the timer fires.
        delay: Duration,
        /// Generation to send back.
        generation: u64,
    },
    /// Any scheduled revert timer is obsolete.
    CancelRevertTimer,
}
