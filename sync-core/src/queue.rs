//! Operation queue with eager compaction.
//!
//! Every mutation that cannot go straight to the remote store is recorded
//! here. On enqueue, operations on the same item are merged or cancelled so
//! replay sends the minimum number of remote calls:
//!
//! - an edit of an item that was never synced rewrites its `Add` in place
//! - only the newest `Update` for an item survives, moved to the end
//! - two adjacent toggles of the same item cancel out
//! - a delete drops everything queued before it for that item, and an item
//!   that was never synced disappears from the queue entirely
//!
//! The functions take a `sealed` count: the number of leading entries that
//! may already have reached the remote store (captured by a replay pass in
//! flight, or applied by a pass that later failed). Entries inside the sealed
//! prefix are never rewritten or removed. Where a rule would touch one, the
//! new operation is appended instead and replay resolves its target through
//! the id remap.

use sync_types::{PendingOperation, TodoDraft, TodoEdit, TodoId};

/// Append a fresh `Add`. Adds never merge.
pub fn enqueue_add(
    ops: &[PendingOperation],
    local_id: TodoId,
    draft: &TodoDraft,
) -> Vec<PendingOperation> {
    let mut out = ops.to_vec();
    out.push(PendingOperation::add(local_id, draft));
    out
}

/// Record an edit.
pub fn enqueue_update(
    ops: &[PendingOperation],
    sealed: usize,
    edit: &TodoEdit,
) -> Vec<PendingOperation> {
    let sealed = sealed.min(ops.len());
    let mut out = ops.to_vec();

    if let Some(pos) = unsealed_add_position(&out, sealed, &edit.id) {
        if let PendingOperation::Add {
            text,
            category,
            priority,
            ..
        } = &mut out[pos]
        {
            text.clone_from(&edit.text);
            category.clone_from(&edit.category);
            *priority = edit.priority;
        }
        // Updates appended while the Add was sealed would override the new text.
        remove_unsealed(&mut out, sealed, |op| {
            matches!(op, PendingOperation::Update { id, .. } if *id == edit.id)
        });
        return out;
    }

    remove_unsealed(&mut out, sealed, |op| {
        matches!(op, PendingOperation::Update { id, .. } if *id == edit.id)
    });
    out.push(PendingOperation::update(edit));
    out
}

/// Record a completion toggle.
pub fn enqueue_toggle(
    ops: &[PendingOperation],
    sealed: usize,
    target: &TodoId,
) -> Vec<PendingOperation> {
    let sealed = sealed.min(ops.len());
    let mut out = ops.to_vec();

    if let Some(pos) = unsealed_add_position(&out, sealed, target) {
        if let PendingOperation::Add { is_completed, .. } = &mut out[pos] {
            *is_completed = !*is_completed;
        }
        return out;
    }

    let last_cancels = out.len() > sealed
        && matches!(out.last(), Some(PendingOperation::Toggle { id }) if id == target);
    if last_cancels {
        out.pop();
    } else {
        out.push(PendingOperation::Toggle { id: target.clone() });
    }
    out
}

/// Record a deletion.
pub fn enqueue_delete(
    ops: &[PendingOperation],
    sealed: usize,
    target: &TodoId,
) -> Vec<PendingOperation> {
    let sealed = sealed.min(ops.len());
    let mut out = ops.to_vec();

    if unsealed_add_position(&out, sealed, target).is_some() {
        // Never reached the remote: nothing to send at all.
        remove_unsealed(&mut out, sealed, |op| op.target_id() == target);
        return out;
    }

    remove_unsealed(&mut out, sealed, |op| {
        !matches!(op, PendingOperation::Add { .. }) && op.target_id() == target
    });
    out.push(PendingOperation::Delete { id: target.clone() });
    out
}

fn unsealed_add_position(ops: &[PendingOperation], sealed: usize, id: &TodoId) -> Option<usize> {
    ops.iter()
        .enumerate()
        .skip(sealed)
        .find(|(_, op)| op.is_add_for(id))
        .map(|(i, _)| i)
}

fn remove_unsealed<F>(ops: &mut Vec<PendingOperation>, sealed: usize, mut pred: F)
where
    F: FnMut(&PendingOperation) -> bool,
{
    let mut index = 0;
    ops.retain(|op| {
        let keep = index < sealed || !pred(op);
        index += 1;
        keep
    });
}

/// Ordered queue of pending operations.
///
/// Thin owner around the compaction functions above.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationQueue {
    ops: Vec<PendingOperation>,
}

impl OperationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap operations loaded from persistence.
    pub fn from_ops(ops: Vec<PendingOperation>) -> Self {
        Self { ops }
    }

    /// Queued operations in replay order.
    pub fn ops(&self) -> &[PendingOperation] {
        &self.ops
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// See [`enqueue_add`].
    pub fn push_add(&mut self, local_id: TodoId, draft: &TodoDraft) {
        self.ops = enqueue_add(&self.ops, local_id, draft);
    }

    /// See [`enqueue_update`].
    pub fn push_update(&mut self, sealed: usize, edit: &TodoEdit) {
        self.ops = enqueue_update(&self.ops, sealed, edit);
    }

    /// See [`enqueue_toggle`].
    pub fn push_toggle(&mut self, sealed: usize, id: &TodoId) {
        self.ops = enqueue_toggle(&self.ops, sealed, id);
    }

    /// See [`enqueue_delete`].
    pub fn push_delete(&mut self, sealed: usize, id: &TodoId) {
        self.ops = enqueue_delete(&self.ops, sealed, id);
    }

    /// Remove the first `count` operations after they were replayed, and point
    /// the remaining ones at the server ids assigned during that replay.
    pub fn commit_replayed<'a, F>(&mut self, count: usize, resolve: F)
    where
        F: Fn(&TodoId) -> Option<&'a TodoId>,
    {
        let count = count.min(self.ops.len());
        self.ops.drain(..count);
        for op in &mut self.ops {
            if let Some(server_id) = resolve(op.target_id()) {
                op.retarget(server_id.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::Priority;

    fn local(n: u32) -> TodoId {
        TodoId::from(format!("local:{}:abcdef", n))
    }

    fn server(n: u32) -> TodoId {
        TodoId::server(format!("server-{}", n))
    }

    fn draft(text: &str) -> TodoDraft {
        TodoDraft::new(text, "General", Priority::Medium).unwrap()
    }

    fn edit(id: &TodoId, text: &str) -> TodoEdit {
        TodoEdit::new(id.clone(), text, "Work", Priority::High).unwrap()
    }

    // ===========================================
    // Add
    // ===========================================

    #[test]
    fn add_appends_without_merging() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_add(&ops, local(2), &draft("b"));
        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_add_for(&local(1)));
        assert!(ops[1].is_add_for(&local(2)));
    }

    // ===========================================
    // Update
    // ===========================================

    #[test]
    fn update_on_unsynced_add_rewrites_in_place() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_toggle(&ops, 0, &server(5));
        let ops = enqueue_update(&ops, 0, &edit(&local(1), "changed"));

        assert_eq!(ops.len(), 2);
        match &ops[0] {
            PendingOperation::Add {
                text,
                category,
                priority,
                ..
            } => {
                assert_eq!(text, "changed");
                assert_eq!(category, "Work");
                assert_eq!(*priority, Priority::High);
            }
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn newest_update_wins_and_moves_to_end() {
        let ops = enqueue_update(&[], 0, &edit(&server(1), "first"));
        let ops = enqueue_toggle(&ops, 0, &server(2));
        let ops = enqueue_update(&ops, 0, &edit(&server(1), "second"));

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], PendingOperation::Toggle { id } if *id == server(2)));
        assert!(
            matches!(&ops[1], PendingOperation::Update { id, text, .. } if *id == server(1) && text == "second")
        );
    }

    #[test]
    fn update_never_touches_sealed_entries() {
        let ops = enqueue_update(&[], 0, &edit(&server(1), "in flight"));
        let ops = enqueue_update(&ops, 1, &edit(&server(1), "later"));

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], PendingOperation::Update { text, .. } if text == "in flight"));
        assert!(matches!(&ops[1], PendingOperation::Update { text, .. } if text == "later"));
    }

    #[test]
    fn update_on_sealed_add_appends_update_for_local_id() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_update(&ops, 1, &edit(&local(1), "b"));

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], PendingOperation::Add { text, .. } if text == "a"));
        assert!(matches!(&ops[1], PendingOperation::Update { id, .. } if *id == local(1)));
    }

    // ===========================================
    // Toggle
    // ===========================================

    #[test]
    fn double_toggle_cancels() {
        let ops = enqueue_toggle(&[], 0, &server(1));
        let ops = enqueue_toggle(&ops, 0, &server(1));
        assert!(ops.is_empty());
    }

    #[test]
    fn toggles_separated_by_other_ops_do_not_cancel() {
        let ops = enqueue_toggle(&[], 0, &server(1));
        let ops = enqueue_toggle(&ops, 0, &server(2));
        let ops = enqueue_toggle(&ops, 0, &server(1));
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn toggle_on_unsynced_add_flips_flag() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_toggle(&ops, 0, &local(1));
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], PendingOperation::Add { is_completed: true, .. }));

        let ops = enqueue_toggle(&ops, 0, &local(1));
        assert!(matches!(ops[0], PendingOperation::Add { is_completed: false, .. }));
    }

    #[test]
    fn sealed_toggle_is_not_cancelled() {
        let ops = enqueue_toggle(&[], 0, &server(1));
        let ops = enqueue_toggle(&ops, 1, &server(1));
        assert_eq!(ops.len(), 2);
    }

    // ===========================================
    // Delete
    // ===========================================

    #[test]
    fn add_then_delete_elides_both() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_toggle(&ops, 0, &local(1));
        let ops = enqueue_update(&ops, 0, &edit(&local(1), "b"));
        let ops = enqueue_delete(&ops, 0, &local(1));
        assert!(ops.is_empty());
    }

    #[test]
    fn delete_supersedes_prior_ops() {
        let ops = enqueue_update(&[], 0, &edit(&server(1), "x"));
        let ops = enqueue_toggle(&ops, 0, &server(2));
        let ops = enqueue_toggle(&ops, 0, &server(1));
        let ops = enqueue_delete(&ops, 0, &server(1));

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], PendingOperation::Toggle { id } if *id == server(2)));
        assert!(matches!(&ops[1], PendingOperation::Delete { id } if *id == server(1)));
    }

    #[test]
    fn delete_of_sealed_add_is_appended() {
        let ops = enqueue_add(&[], local(1), &draft("a"));
        let ops = enqueue_toggle(&ops, 1, &local(1));
        let ops = enqueue_delete(&ops, 1, &local(1));

        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_add_for(&local(1)));
        assert!(matches!(&ops[1], PendingOperation::Delete { id } if *id == local(1)));
    }

    #[test]
    fn unsealed_add_delete_clears_ops_appended_while_sealed() {
        // Toggle was appended while the Add was sealed; the pass then failed
        // before reaching the Add, so it is unsealed again.
        let ops = vec![
            PendingOperation::Toggle { id: server(9) },
            PendingOperation::add(local(1), &draft("a")),
            PendingOperation::Toggle { id: local(1) },
        ];
        let ops = enqueue_delete(&ops, 0, &local(1));
        assert_eq!(ops, vec![PendingOperation::Toggle { id: server(9) }]);
    }

    // ===========================================
    // Properties
    // ===========================================

    #[test]
    fn compaction_is_idempotent_for_repeated_updates() {
        let e = edit(&server(1), "same");
        let once = enqueue_update(&[], 0, &e);
        let twice = enqueue_update(&once, 0, &e);
        assert_eq!(once, twice);
    }

    #[test]
    fn at_most_one_update_per_target() {
        let mut ops = Vec::new();
        for i in 0..10 {
            ops = enqueue_update(&ops, 0, &edit(&server(i % 3), &format!("v{}", i)));
        }
        for n in 0..3 {
            let count = ops
                .iter()
                .filter(|op| matches!(op, PendingOperation::Update { id, .. } if *id == server(n)))
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn sealed_larger_than_queue_is_clamped() {
        let ops = enqueue_toggle(&[], 10, &server(1));
        let ops = enqueue_toggle(&ops, 10, &server(1));
        assert_eq!(ops.len(), 2);
    }

    // ===========================================
    // OperationQueue
    // ===========================================

    #[test]
    fn commit_drains_prefix_and_remaps_rest() {
        let mut queue = OperationQueue::new();
        queue.push_add(local(1), &draft("a"));
        queue.push_toggle(1, &local(1));
        queue.push_toggle(1, &server(7));

        let map: std::collections::BTreeMap<TodoId, TodoId> =
            [(local(1), server(1))].into_iter().collect();
        queue.commit_replayed(1, |id| map.get(id));

        assert_eq!(
            queue.ops(),
            &[
                PendingOperation::Toggle { id: server(1) },
                PendingOperation::Toggle { id: server(7) },
            ]
        );
    }

    #[test]
    fn commit_with_everything_replayed_empties_queue() {
        let mut queue = OperationQueue::from_ops(vec![PendingOperation::Delete { id: server(1) }]);
        queue.commit_replayed(1, |_| None);
        assert!(queue.is_empty());
    }
}
