/// A task waiting for its due time, tagged with the generation that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled<T> {
    pub due_ms: f64,
    pub generation: u64,
    pub task: T,
}

/// Deferred work polled against the frame clock.
///
/// The scheduler itself never drops tasks on a generation change: owners
/// compare [`Scheduled::generation`] with their current generation when a
/// task comes due and ignore stale ones.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    pending: Vec<Scheduled<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue `task` to come due at `due_ms`.
    pub fn schedule(&mut self, due_ms: f64, generation: u64, task: T) {
        self.pending.push(Scheduled {
            due_ms,
            generation,
            task,
        });
    }

    /// Remove and return every task due at or before `now_ms`, oldest first.
    pub fn poll(&mut self, now_ms: f64) -> Vec<Scheduled<T>> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|s| s.due_ms <= now_ms);
        self.pending = waiting;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_due_before_time() {
        let mut s = Scheduler::new();
        s.schedule(1000.0, 1, "spawn");
        assert!(s.poll(999.0).is_empty());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn due_tasks_are_removed_in_order() {
        let mut s = Scheduler::new();
        s.schedule(300.0, 1, 'b');
        s.schedule(100.0, 1, 'a');
        s.schedule(900.0, 1, 'c');
        let due: Vec<char> = s.poll(500.0).into_iter().map(|t| t.task).collect();
        assert_eq!(due, vec!['a', 'b']);
        assert_eq!(s.len(), 1);
        assert!(s.poll(500.0).is_empty());
    }

    #[test]
    fn generation_travels_with_task() {
        let mut s = Scheduler::new();
        s.schedule(10.0, 4, ());
        let due = s.poll(10.0);
        assert_eq!(due[0].generation, 4);
        assert!(s.is_empty());
    }
}
