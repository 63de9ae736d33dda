//! Replay bookkeeping for queued operations.
//!
//! A [`ReplaySession`] walks a captured queue and tells the caller which
//! remote call to make next. The caller performs the call and reports the
//! result back with [`ReplaySession::complete`]. No I/O happens here.
//!
//! Progress is recorded in a [`ReplayJournal`] after every step. When a pass
//! fails halfway, persisting the journal lets the next pass skip the prefix
//! that already reached the remote store, so an `Add` is never submitted twice
//! and later operations still resolve local ids to the right server ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sync_types::{PendingOperation, TodoDraft, TodoEdit, TodoId};
use thiserror::Error;

/// Persisted progress of an incomplete replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayJournal {
    /// Number of leading queue entries already applied remotely.
    pub applied: usize,
    /// Local ids mapped to the server ids the remote assigned.
    #[serde(default)]
    pub id_map: BTreeMap<TodoId, TodoId>,
    /// Server id still owed a completion toggle after its add.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_pending: Option<TodoId>,
}

impl ReplayJournal {
    /// True when no pass has left progress behind.
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.id_map.is_empty() && self.completion_pending.is_none()
    }

    /// Resolve an id through the remap.
    pub fn resolve(&self, id: &TodoId) -> TodoId {
        self.id_map.get(id).cloned().unwrap_or_else(|| id.clone())
    }
}

/// A call the caller must make against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// Create the item; the remote answers with a server id.
    Add {
        /// Id the item is known by locally.
        local_id: TodoId,
        /// Content to create.
        draft: TodoDraft,
    },
    /// Overwrite an item. `edit.id` is already a server id.
    Update {
        /// The edit to send.
        edit: TodoEdit,
    },
    /// Flip completion of an item.
    Toggle {
        /// Server id.
        id: TodoId,
    },
    /// Remove an item.
    Delete {
        /// Server id.
        id: TodoId,
    },
}

/// Next step of a replay pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// Perform this call, then report with [`ReplaySession::complete`].
    Call(RemoteCall),
    /// An operation targets a local id with no server counterpart and was
    /// skipped. The caller may log it; the session has already moved on.
    Skipped {
        /// Operation kind (`update`, `toggle`, `delete`).
        kind: &'static str,
        /// The unresolved local id.
        id: TodoId,
    },
    /// Every operation has been applied.
    Done,
}

/// Result of a remote call made on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    /// An add succeeded and the remote assigned this id.
    Added(TodoId),
    /// Any other call succeeded.
    Done,
}

/// Errors from misuse of a [`ReplaySession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// A result was reported with no call outstanding.
    #[error("no remote call is outstanding")]
    NothingInFlight,

    /// The reported result does not match the outstanding call.
    #[error("expected {expected} result for outstanding call")]
    UnexpectedResult {
        /// What the outstanding call should have produced.
        expected: &'static str,
    },

    /// [`ReplaySession::finish`] was called before all operations were applied.
    #[error("replay finished early: {applied} of {total} operations applied")]
    Incomplete {
        /// Operations applied.
        applied: usize,
        /// Operations captured.
        total: usize,
    },
}

/// What a completed pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Number of captured operations consumed by the pass.
    pub consumed: usize,
    /// Remote calls made across this and any earlier journaled passes.
    pub replayed: usize,
    /// Local ids mapped to server ids.
    pub id_map: BTreeMap<TodoId, TodoId>,
    /// Server ids deleted remotely.
    pub deleted: Vec<TodoId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InFlight {
    Add { local_id: TodoId, is_completed: bool },
    Completion,
    Op { deleted: Option<TodoId> },
}

/// Step-by-step replay of a captured queue.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    ops: Vec<PendingOperation>,
    journal: ReplayJournal,
    in_flight: Option<InFlight>,
    replayed: usize,
    deleted: Vec<TodoId>,
}

impl ReplaySession {
    /// Start a pass over `ops`, continuing from `journal`.
    ///
    /// A journal that claims more progress than there are operations cannot
    /// belong to this queue and is ignored.
    pub fn resume(ops: Vec<PendingOperation>, journal: &ReplayJournal) -> Self {
        let journal = if journal.applied > ops.len() {
            ReplayJournal::default()
        } else {
            journal.clone()
        };
        Self {
            ops,
            journal,
            in_flight: None,
            replayed: 0,
            deleted: Vec::new(),
        }
    }

    /// Progress so far, to be persisted after each step.
    pub fn journal(&self) -> &ReplayJournal {
        &self.journal
    }

    /// Number of operations captured by this pass.
    pub fn total(&self) -> usize {
        self.ops.len()
    }

    /// Decide the next step.
    ///
    /// Returns the outstanding call again if the previous one was not yet
    /// completed.
    pub fn next_step(&mut self) -> ReplayStep {
        if let Some(id) = &self.journal.completion_pending {
            self.in_flight = Some(InFlight::Completion);
            return ReplayStep::Call(RemoteCall::Toggle { id: id.clone() });
        }

        loop {
            let Some(op) = self.ops.get(self.journal.applied) else {
                self.in_flight = None;
                return ReplayStep::Done;
            };

            match op {
                PendingOperation::Add {
                    local_id,
                    text,
                    category,
                    priority,
                    is_completed,
                } => {
                    if self.journal.id_map.contains_key(local_id) {
                        // Created by an earlier pass.
                        self.journal.applied += 1;
                        continue;
                    }
                    self.in_flight = Some(InFlight::Add {
                        local_id: local_id.clone(),
                        is_completed: *is_completed,
                    });
                    return ReplayStep::Call(RemoteCall::Add {
                        local_id: local_id.clone(),
                        draft: TodoDraft {
                            text: text.clone(),
                            category: category.clone(),
                            priority: *priority,
                        },
                    });
                }
                other => {
                    let target = self.journal.resolve(other.target_id());
                    if target.is_local() {
                        let kind = other.kind();
                        self.journal.applied += 1;
                        return ReplayStep::Skipped { kind, id: target };
                    }
                    let call = match other {
                        PendingOperation::Update {
                            text,
                            category,
                            priority,
                            ..
                        } => RemoteCall::Update {
                            edit: TodoEdit {
                                id: target.clone(),
                                text: text.clone(),
                                category: category.clone(),
                                priority: *priority,
                            },
                        },
                        PendingOperation::Toggle { .. } => RemoteCall::Toggle {
                            id: target.clone(),
                        },
                        _ => RemoteCall::Delete {
                            id: target.clone(),
                        },
                    };
                    let deleted = matches!(call, RemoteCall::Delete { .. }).then_some(target);
                    self.in_flight = Some(InFlight::Op { deleted });
                    return ReplayStep::Call(call);
                }
            }
        }
    }

    /// Record the result of the outstanding call.
    pub fn complete(&mut self, result: CallResult) -> Result<(), ReplayError> {
        let in_flight = self.in_flight.take().ok_or(ReplayError::NothingInFlight)?;
        match (in_flight, result) {
            (
                InFlight::Add {
                    local_id,
                    is_completed,
                },
                CallResult::Added(server_id),
            ) => {
                self.journal.id_map.insert(local_id, server_id.clone());
                self.journal.applied += 1;
                if is_completed {
                    self.journal.completion_pending = Some(server_id);
                }
            }
            (InFlight::Completion, CallResult::Done) => {
                self.journal.completion_pending = None;
            }
            (InFlight::Op { deleted }, CallResult::Done) => {
                self.journal.applied += 1;
                if let Some(id) = deleted {
                    self.deleted.push(id);
                }
            }
            (in_flight, _) => {
                let expected = match in_flight {
                    InFlight::Add { .. } => "added",
                    _ => "done",
                };
                self.in_flight = Some(in_flight);
                return Err(ReplayError::UnexpectedResult { expected });
            }
        }
        self.replayed += 1;
        Ok(())
    }

    /// Close a pass once [`ReplaySession::next_step`] returned
    /// [`ReplayStep::Done`].
    pub fn finish(self) -> Result<ReplayOutcome, ReplayError> {
        let total = self.ops.len();
        if self.journal.applied < total || self.journal.completion_pending.is_some() {
            return Err(ReplayError::Incomplete {
                applied: self.journal.applied,
                total,
            });
        }
        Ok(ReplayOutcome {
            consumed: total,
            replayed: self.replayed,
            id_map: self.journal.id_map,
            deleted: self.deleted,
        })
    }
}
