//! Single-threaded event queue on a virtual clock
//!
//! Delayed continuations are pushed with a delay relative to `now` and come
//! back out in due-time order. Events due at the same instant are returned in
//! the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::Millis;

#[derive(Debug, Clone)]
struct Pending<E> {
    due: Millis,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Pending<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Pending<E> {}

impl<E> Ord for Pending<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E> PartialOrd for Pending<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now: Millis,
    next_seq: u64,
    queue: BinaryHeap<Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<E> Scheduler<E> {
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Queue `event` to fire `delay` ms from now. Returns its due time.
    pub fn schedule(&mut self, delay: Millis, event: E) -> Millis {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Pending { due, seq, event });
        due
    }

    /// Pop the earliest event if it is due at or before `until`, moving the
    /// clock to its due time
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, E)> {
        if self.queue.peek()?.due > until {
            return None;
        }
        self.pop_next()
    }

    /// Pop the earliest event regardless of due time
    pub fn pop_next(&mut self) -> Option<(Millis, E)> {
        let pending = self.queue.pop()?;
        self.now = self.now.max(pending.due);
        Some((pending.due, pending.event))
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, time: Millis) {
        self.now = self.now.max(time);
    }

    /// Drop every pending event; the clock keeps its reading
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.queue.peek().map(|p| p.due)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
