struct Entry<T> {
    /// Scheduling sequence number.
    seq: u64,
    due: u64,
    task: T,
}

/// Delayed work keyed by the session's tick counter.
///
/// Tasks come back out of [`drain_due`](Self::drain_due) in due-tick order,
/// and in scheduling order for tasks due on the same tick. The scheduler
/// knows nothing about what a task targets: callers validate the target
/// before acting on a drained task.
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Run `task` once the tick counter reaches `now + delay`.
    pub fn schedule(&mut self, now: u64, delay: u64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            seq,
            due: now.saturating_add(delay),
            task,
        });
    }

    /// Take every task due at or before `now`.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due <= now {
                due.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|e| (e.due, e.seq));
        due.into_iter().map(|e| e.task).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_on_their_tick() {
        let mut s = Scheduler::new();
        s.schedule(10, 5, "late");
        s.schedule(10, 2, "early");

        assert!(s.drain_due(11).is_empty());
        assert_eq!(s.drain_due(12), vec!["early"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.drain_due(100), vec!["late"]);
        assert!(s.is_empty());
    }

    #[test]
    fn drained_in_due_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(0, 3, 'c');
        s.schedule(0, 1, 'a');
        s.schedule(0, 3, 'd');
        s.schedule(1, 0, 'b');
        assert_eq!(s.drain_due(3), vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut s = Scheduler::new();
        s.schedule(0, 10, ());
        s.clear();
        assert!(s.drain_due(u64::MAX).is_empty());
    }
}
