//! Virtual-clock scheduler.
//!
//! Every delay in an experience is a single-shot timer. Timers live in one
//! queue ordered by due time and then by insertion, so two tasks due at the
//! same millisecond run in the order they were scheduled.

use std::collections::BTreeMap;

use talkar_core::{Duration, Timestamp};

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Timestamp,
    seq: u64,
    queue: BTreeMap<(u64, u64), (Timestamp, T)>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Timestamp::zero(),
            seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// The current virtual time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Queue `task` to run at `at`. Times in the past run on the next advance.
    pub fn schedule_at(&mut self, at: Timestamp, task: T) {
        let at = if at < self.now { self.now } else { at };
        self.queue.insert((at.as_millis(), self.seq), (at, task));
        self.seq += 1;
    }

    /// Queue `task` to run `delay` from now.
    pub fn schedule_after(&mut self, delay: Duration, task: T) {
        self.schedule_at(self.now + delay, task);
    }

    /// When the earliest queued task is due.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.values().next().map(|(at, _)| *at)
    }

    /// Remove the earliest task due at or before `until`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, until: Timestamp) -> Option<(Timestamp, T)> {
        let key = *self.queue.keys().next()?;
        if key.0 > until.as_millis() {
            return None;
        }
        let (at, task) = self.queue.remove(&key)?;
        if at > self.now {
            self.now = at;
        }
        Some((at, task))
    }

    /// Move the clock forward without running anything.
    pub fn advance(&mut self, to: Timestamp) {
        if to > self.now {
            self.now = to;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule_after(Duration::from_millis(200.0), "late");
        s.schedule_after(Duration::from_millis(10.0), "early");
        let until = Timestamp::from_millis(1000);
        assert_eq!(s.pop_due(until).map(|(_, t)| t), Some("early"));
        assert_eq!(s.now().as_millis(), 10);
        assert_eq!(s.pop_due(until).map(|(_, t)| t), Some("late"));
        assert!(s.pop_due(until).is_none());
    }

    #[test]
    fn test_same_time_keeps_insertion_order() {
        let mut s = Scheduler::new();
        for name in ["a", "b", "c"] {
            s.schedule_after(Duration::from_millis(10.0), name);
        }
        let until = Timestamp::from_millis(10);
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(until).map(|(_, t)| t)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_not_yet_due() {
        let mut s = Scheduler::new();
        s.schedule_after(Duration::from_seconds(7.0), ());
        assert!(s.pop_due(Timestamp::from_millis(6999)).is_none());
        assert_eq!(s.next_deadline(), Some(Timestamp::from_millis(7000)));
        assert!(s.pop_due(Timestamp::from_millis(7000)).is_some());
    }

    #[test]
    fn test_past_times_clamp_to_now() {
        let mut s = Scheduler::new();
        s.advance(Timestamp::from_millis(500));
        s.schedule_at(Timestamp::from_millis(100), "x");
        assert_eq!(s.next_deadline(), Some(Timestamp::from_millis(500)));
    }
}
