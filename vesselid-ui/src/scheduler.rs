//! Explicit task queue with a virtual clock
//!
//! Deferred work (validation after the current edit settles, delayed
//! dismissal of a suggestion panel) is queued here instead of relying on an
//! implicit event-loop tick. Time only moves when the owner calls
//! [`TaskQueue::advance`], which makes ordering fully deterministic.
//!
//! **Ordering:** due tasks come out by deadline, then by schedule order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

/// Cancellation handle returned by [`TaskQueue::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct ScheduledTask<T> {
    deadline: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for ScheduledTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for ScheduledTask<T> {}

impl<T> PartialOrd for ScheduledTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed so the max-heap yields the earliest deadline first
impl<T> Ord for ScheduledTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-owner queue of delayed tasks
pub struct TaskQueue<T> {
    now: Duration,
    next_seq: u64,
    heap: BinaryHeap<ScheduledTask<T>>,
    live: HashSet<u64>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            heap: BinaryHeap::new(),
            live: HashSet::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `task` to become due `delay` after the current virtual time
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledTask {
            deadline: self.now + delay,
            seq,
            task,
        });
        self.live.insert(seq);
        TaskHandle(seq)
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.live.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.live.contains(&handle.0)
    }

    /// Move the clock forward and return every task now due
    pub fn advance(&mut self, by: Duration) -> Vec<T> {
        self.now += by;
        let mut due = Vec::new();
        while let Some(top) = self.heap.peek() {
            if top.deadline > self.now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                // Cancelled entries are dropped lazily
                if self.live.remove(&entry.seq) {
                    due.push(entry.task);
                }
            }
        }
        due
    }

    /// Run everything due without moving the clock
    pub fn settle(&mut self) -> Vec<T> {
        self.advance(Duration::ZERO)
    }

    /// Number of live (not yet run, not cancelled) tasks
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Earliest deadline among live tasks
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|t| self.live.contains(&t.seq))
            .map(|t| t.deadline)
            .min()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}
