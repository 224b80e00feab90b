//! Cooperative single-shot timers driven by the host's frame loop.
//!
//! Nothing here owns a thread: time only moves when [`Scheduler::advance_to`]
//! is called. Due timers are popped one at a time in due order, so a handler
//! can schedule follow-up timers relative to the moment it fired.

use std::time::Duration;

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Advance,
    Finish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub action: TimerAction,
    pub due: Duration,
}

#[derive(Clone, Copy, Debug)]
struct PendingTimer {
    handle: TimerHandle,
    action: TimerAction,
    due: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `action` to fire `delay` after the current clock.
    pub fn schedule_once(&mut self, delay: Duration, action: TimerAction) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(PendingTimer {
            handle,
            action,
            due: self.now.saturating_add(delay),
        });
        handle
    }

    /// Cancels a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|timer| timer.handle == handle)
    }

    /// Time left before `handle` fires.
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.pending
            .iter()
            .find(|timer| timer.handle == handle)
            .map(|timer| timer.due.saturating_sub(self.now))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pops the earliest timer due at or before `target`, moving the clock to
    /// its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, target: Duration) -> Option<FiredTimer> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.handle))
            .map(|(position, _)| position)?;
        let timer = self.pending.remove(position);
        self.now = self.now.max(timer.due);
        Some(FiredTimer {
            handle: timer.handle,
            action: timer.action,
            due: timer.due,
        })
    }

    /// Moves the clock forward to `target` once every due timer was popped.
    pub fn advance_to(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }
}
