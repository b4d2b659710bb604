//! Deferred action queue
//!
//! Replaces wall-clock timers: actions are stamped with a fire time on the
//! session clock and drained by the host tick. Equal fire times run in the
//! order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::bubble::BubbleId;

/// Work deferred to a later tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// End of a bubble's spawn grace period
    Activate(BubbleId),
    /// Anticipation is over: snapshot, sort and start detonating
    BeginExplosion { cascade: u64 },
    /// Destroy one bubble as part of a cascade
    Detonate {
        cascade: u64,
        id: BubbleId,
        index: usize,
        total: usize,
    },
    /// Last detonation has been issued
    Settle { cascade: u64 },
    /// Cooldown elapsed, sequencer returns to idle
    Finish { cascade: u64 },
}

impl ScheduledAction {
    /// Cascade this action belongs to, if any
    pub fn cascade(&self) -> Option<u64> {
        match *self {
            ScheduledAction::Activate(_) => None,
            ScheduledAction::BeginExplosion { cascade }
            | ScheduledAction::Detonate { cascade, .. }
            | ScheduledAction::Settle { cascade }
            | ScheduledAction::Finish { cascade } => Some(cascade),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    fire_at: f64,
    seq: u64,
    action: ScheduledAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap yields the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of `(fire_at, action)` entries
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action; non-finite times fire immediately
    pub fn schedule(&mut self, fire_at: f64, action: ScheduledAction) {
        let fire_at = if fire_at.is_finite() { fire_at } else { f64::MIN };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            fire_at,
            seq,
            action,
        });
    }

    /// Pop the earliest action due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<(f64, ScheduledAction)> {
        if self.heap.peek()?.fire_at > now {
            return None;
        }
        self.heap.pop().map(|e| (e.fire_at, e.action))
    }

    /// Fire time of the earliest pending action
    pub fn next_fire_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.fire_at)
    }

    /// Drop every pending action matching `predicate`, returning how many
    pub fn cancel<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ScheduledAction) -> bool,
    {
        let before = self.heap.len();
        self.heap.retain(|e| !predicate(&e.action));
        before - self.heap.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ScheduledAction> {
        self.heap.iter().map(|e| &e.action)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
