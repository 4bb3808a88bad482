use std::time::Instant;

/// Fixed-delay tasks fired from the frame tick.
///
/// Tasks come out in deadline order, ties in scheduling order, so a single
/// late tick replays everything that came due in between.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

#[derive(Debug)]
struct Entry<T> {
    at: Instant,
    seq: u64,
    task: T,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, at: Instant, task: T) {
        self.entries.push(Entry {
            at,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.at <= now)
            .min_by_key(|(_, entry)| (entry.at, entry.seq))
            .map(|(index, _)| index)?;

        let entry = self.entries.swap_remove(index);
        Some((entry.at, entry.task))
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
    use std::time::Duration;

    #[test]
    fn pops_in_deadline_then_schedule_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::default();
        queue.schedule(t0 + Duration::from_millis(300), "c");
        queue.schedule(t0 + Duration::from_millis(100), "a");
        queue.schedule(t0 + Duration::from_millis(100), "b");
        queue.schedule(t0 + Duration::from_millis(900), "d");

        let now = t0 + Duration::from_millis(500);
        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(now).map(|(_, task)| task)).collect();

        assert_eq!(fired, vec!["a", "b", "c"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn nothing_due_before_deadline() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::default();
        queue.schedule(t0 + Duration::from_millis(50), ());

        assert!(queue.pop_due(t0).is_none());
        assert!(queue.pop_due(t0 + Duration::from_millis(50)).is_some());
        assert!(queue.is_empty());
    }
}
