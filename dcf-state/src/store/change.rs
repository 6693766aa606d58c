use dcf_store::StoreId;
use dcf_store::stack::Stack;

use super::{CELLS, CHANGES, Subscriber};

/// Pending store notifications drained by the runtime once per cycle.
/// Each entry carries the subscribers as they were at drain time.
pub type Changes = Stack<(StoreId, Vec<Subscriber>)>;

// Record a write to a store cell.
//
// The pending flag on the cell collapses any number of writes within
// one drain cycle into a single entry; subscribers observe only the
// last value written.
pub(crate) fn changed(id: StoreId) {
    let first_write = CELLS.with_borrow_mut(|cells| match cells.get_mut(id) {
        Some(cell) if !cell.pending => {
            cell.pending = true;
            true
        }
        _ => false,
    });

    if first_write {
        CHANGES.with_borrow_mut(|changes| changes.push(id));
    }
}

/// Drain the pending notifications into a local queue, oldest first.
/// Clears the pending guard on every drained cell, so writes that
/// happen while the caller processes the queue start a new cycle.
pub fn drain_changes(local: &mut Changes) {
    CHANGES.with_borrow_mut(|changes| {
        CELLS.with_borrow_mut(|cells| {
            for id in changes.drain().rev() {
                let Some(cell) = cells.get_mut(id) else { continue };
                cell.pending = false;
                let subscribers = cell.subscribers.iter().collect();
                local.push((id, subscribers));
            }
        });
    });
}

/// `true` while any store has an undrained change.
pub fn has_changes() -> bool {
    CHANGES.with_borrow(|changes| !changes.is_empty())
}

/// Clear all pending changes without notifying anyone.
pub fn clear_all_changes() {
    CHANGES.with_borrow_mut(|changes| {
        CELLS.with_borrow_mut(|cells| {
            for id in changes.drain() {
                if let Some(cell) = cells.get_mut(id) {
                    cell.pending = false;
                }
            }
        });
    });
}
