//! Logical-clock timers for the cooperative event loop.
//!
//! Nothing here sleeps. Owners schedule entries against a millisecond clock and
//! drain whatever is due when the loop hands them the current time.

/// Milliseconds on the session's monotonic clock.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<K> {
    pub id: TimerId,
    pub kind: K,
    pub due: Millis,
}

#[derive(Debug, Clone)]
struct Entry<K> {
    id: TimerId,
    due: Millis,
    every: Option<Millis>,
    kind: K,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K: Copy> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Fire once, `delay` after `now`.
    pub fn once(&mut self, now: Millis, delay: Millis, kind: K) -> TimerId {
        self.insert(now.saturating_add(delay), None, kind)
    }

    /// Fire every `interval` starting one interval after `now`.
    pub fn every(&mut self, now: Millis, interval: Millis, kind: K) -> TimerId {
        let interval = interval.max(1);
        self.insert(now.saturating_add(interval), Some(interval), kind)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    /// Pops the earliest entry due at or before `now`. Ties go to the entry
    /// scheduled first. Repeating entries are re-armed instead of removed.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired<K>> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= now)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(pos, _)| pos)?;
        let entry = &self.entries[pos];
        let every = entry.every;
        let fired = Fired {
            id: entry.id,
            kind: entry.kind,
            due: entry.due,
        };
        match every {
            Some(interval) => self.entries[pos].due = fired.due.saturating_add(interval),
            None => {
                self.entries.swap_remove(pos);
            }
        }
        Some(fired)
    }

    fn insert(&mut self, due: Millis, every: Option<Millis>, kind: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due,
            every,
            kind,
        });
        id
    }
}
