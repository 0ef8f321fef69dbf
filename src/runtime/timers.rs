use std::time::Duration;

/// Work the runtime defers to a fixed-delay timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Next height sample for the stabilizer run with this generation.
    StabilizerPoll { generation: u64 },
    /// End of the post-initialization settle delay.
    Ready,
    /// Deferred work for hosts without idle callbacks.
    IdleFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct TimerEntry {
    id: TimerId,
    due: Duration,
    kind: TimerKind,
}

/// Cancellable one-shot timers keyed on host-supplied timestamps.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, kind: TimerKind) -> TimerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = TimerId(self.next_id);
        self.entries.push(TimerEntry { id, due, kind });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    /// Cancel every timer whose kind matches `predicate`.
    pub fn cancel_matching(&mut self, predicate: impl Fn(&TimerKind) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(&entry.kind));
        before - self.entries.len()
    }

    /// Remove and return every timer due at `now`, earliest first. Timers
    /// sharing a deadline come out in scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Vec<TimerKind> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due, entry.id));
        due.into_iter().map(|entry| entry.kind).collect()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
