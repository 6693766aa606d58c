use std::collections::VecDeque;
use std::time::Duration;

use dcf_store::InstanceId;
use dcf_vdom::Priority;
use fxhash::FxHashMap;

/// Per-priority render queues.
///
/// One pending render per instance: repeated updates collapse, and an
/// update at a higher priority promotes the pending one. Entries left
/// behind in a lower queue by a promotion are discarded lazily at pop.
#[derive(Debug, Default)]
pub struct Scheduler {
    queues: [VecDeque<InstanceId>; 5],
    priorities: FxHashMap<InstanceId, Priority>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_index(priority: Priority) -> usize {
        Priority::ALL.iter().position(|p| *p == priority).expect("all priorities are listed")
    }

    pub fn enqueue(&mut self, instance: InstanceId, priority: Priority) {
        match self.priorities.get(&instance) {
            // Already pending at this or a higher priority
            Some(current) if *current <= priority => (),
            _ => {
                self.priorities.insert(instance, priority);
                self.queues[Self::queue_index(priority)].push_back(instance);
            }
        }
    }

    /// Pop the next instance to render.
    ///
    /// Queues drain in priority order. Once the frame budget is spent
    /// only the Immediate queue is served; everything else waits for
    /// the next tick.
    pub fn pop(&mut self, over_budget: bool) -> Option<InstanceId> {
        for (index, priority) in Priority::ALL.into_iter().enumerate() {
            if over_budget && priority != Priority::Immediate {
                return None;
            }

            while let Some(instance) = self.queues[index].pop_front() {
                match self.priorities.get(&instance) {
                    // Entry is current for this queue: take it
                    Some(current) if *current == priority => {
                        self.priorities.remove(&instance);
                        return Some(instance);
                    }
                    // Promoted or already rendered: stale entry
                    _ => continue,
                }
            }
        }

        None
    }

    /// Drop a pending update, e.g. for a destroyed instance.
    pub fn cancel(&mut self, instance: InstanceId) {
        self.priorities.remove(&instance);
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    /// The recommended delay before the next tick: the delay of the
    /// most urgent pending priority.
    pub fn next_delay(&self) -> Option<Duration> {
        self.priorities.values().map(Priority::delay).min()
    }

    pub fn clear(&mut self) {
        self.queues.iter_mut().for_each(VecDeque::clear);
        self.priorities.clear();
    }
}
