use std::any::Any;
use std::cell::RefCell;
use std::time::Duration;

use dcf_store::InstanceId;
use dcf_store::stack::Stack;

/// Update priority. Higher priorities drain first within a frame;
/// the delay is how long an update may sit before it must become
/// eligible.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Immediate,
    High,
    Normal,
    Low,
    Idle,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Immediate,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Idle,
    ];

    pub fn delay(&self) -> Duration {
        match self {
            Priority::Immediate => Duration::from_millis(0),
            Priority::High => Duration::from_millis(1),
            Priority::Normal => Duration::from_millis(2),
            Priority::Low => Duration::from_millis(5),
            Priority::Idle => Duration::from_millis(16),
        }
    }

    /// Derive a priority for a component: an explicitly declared
    /// priority wins, otherwise the type name is matched against
    /// interaction heuristics.
    pub fn for_component(component_type: &str, declared: Option<Priority>) -> Priority {
        if let Some(priority) = declared {
            return priority;
        }

        let name = component_type.to_ascii_lowercase();
        if ["input", "textfield", "scroll"].iter().any(|n| name.contains(n)) {
            Priority::Immediate
        } else if ["button", "modal", "nav"].iter().any(|n| name.contains(n)) {
            Priority::High
        } else if name.contains("debug") {
            Priority::Idle
        } else {
            Priority::Normal
        }
    }
}

/// A hook state write carried by a scheduled update.
pub struct SlotWrite {
    pub slot: usize,
    pub value: Box<dyn Any>,
}

impl std::fmt::Debug for SlotWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotWrite").field("slot", &self.slot).finish_non_exhaustive()
    }
}

/// A request to re-render a component instance.
///
/// `write` is present for `use_state` setters; a store notification
/// schedules a bare re-render.
#[derive(Debug)]
pub struct ScheduledUpdate {
    pub instance: InstanceId,
    pub priority: Priority,
    pub write: Option<SlotWrite>,
}

thread_local! {
    static SCHEDULED: RefCell<Stack<ScheduledUpdate>> = const { RefCell::new(Stack::empty()) };
}

/// Queue an update. Setters call this from anywhere on the render
/// thread; the runtime drains once per tick.
pub fn schedule_update(update: ScheduledUpdate) {
    SCHEDULED.with_borrow_mut(|scheduled| scheduled.push(update));
}

/// Drain pending updates into a local queue, enqueue order preserved.
pub fn drain_scheduled(local: &mut Stack<ScheduledUpdate>) {
    SCHEDULED.with_borrow_mut(|scheduled| scheduled.drain_into(local));
}

/// `true` while updates are waiting to be drained.
pub fn has_scheduled() -> bool {
    SCHEDULED.with_borrow(|scheduled| !scheduled.is_empty())
}

/// Drop all pending updates. Part of engine teardown.
pub fn clear_scheduled() {
    SCHEDULED.with_borrow_mut(|scheduled| scheduled.clear());
}
