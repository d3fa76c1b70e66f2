//! Single-slot deferred action.
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming replaces the
//! previous deadline and cancelling is synchronous and idempotent, so a stale
//! fire cannot happen: once cancelled, a deadline no longer exists to fire.
//!
//! Time is a caller-supplied monotonic millisecond count. The host event loop
//! reads [`TimerSlot::deadline`] to know when to wake and then polls.

/// Monotonic milliseconds supplied by the host.
pub type Millis = u64;

/// Identity of one arming of a slot. Never reused within a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A deadline that is armed and has not fired or been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: Millis,
}

#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    next_id: u64,
    pending: Option<PendingTimer>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot to fire `delay` after `now`, replacing any pending timer.
    pub fn arm(&mut self, now: Millis, delay: Millis) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending = Some(PendingTimer {
            id,
            due_at: now.saturating_add(delay),
        });
        id
    }

    /// Cancel the pending timer, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.pending.take().map(|p| p.id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.pending.map(|p| p.due_at)
    }

    /// Take the pending timer if its deadline has passed.
    pub fn fire_if_due(&mut self, now: Millis) -> Option<PendingTimer> {
        match self.pending {
            Some(p) if p.due_at <= now => self.pending.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_is_empty() {
        let slot = TimerSlot::new();
        assert!(!slot.is_pending());
        assert_eq!(slot.deadline(), None);
    }

    #[test]
    fn arm_sets_deadline() {
        let mut slot = TimerSlot::new();
        slot.arm(100, 50);
        assert_eq!(slot.deadline(), Some(150));
    }

    #[test]
    fn rearming_replaces_previous_timer() {
        let mut slot = TimerSlot::new();
        let first = slot.arm(0, 10);
        let second = slot.arm(0, 500);

        assert_ne!(first, second);
        assert_eq!(slot.deadline(), Some(500));
        assert_eq!(slot.fire_if_due(10), None, "replaced timer must not fire");
    }

    #[test]
    fn fire_before_deadline_returns_none() {
        let mut slot = TimerSlot::new();
        slot.arm(0, 100);
        assert_eq!(slot.fire_if_due(99), None);
        assert!(slot.is_pending());
    }

    #[test]
    fn fire_at_deadline_takes_timer_once() {
        let mut slot = TimerSlot::new();
        let id = slot.arm(0, 100);

        let fired = slot.fire_if_due(100).expect("due");
        assert_eq!(fired.id, id);
        assert_eq!(fired.due_at, 100);
        assert_eq!(slot.fire_if_due(1_000), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut slot = TimerSlot::new();
        let id = slot.arm(0, 100);

        assert_eq!(slot.cancel(), Some(id));
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.fire_if_due(1_000), None);
    }

    #[test]
    fn arm_saturates_on_overflow() {
        let mut slot = TimerSlot::new();
        slot.arm(Millis::MAX - 1, 10);
        assert_eq!(slot.deadline(), Some(Millis::MAX));
    }
}
