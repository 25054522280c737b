//! Deferred work, driven by an explicit clock
//!
//! Every delayed or periodic action the controller needs has its own slot.
//! Scheduling into an occupied slot replaces the pending timer, so at most one
//! timer of each kind is ever live. Nothing here reads a wall clock; the owner
//! passes `now` in milliseconds.

/// One slot per kind of deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic stage recomputation
    Difficulty,
    /// Periodic slow-motion countdown
    SlowMotion,
    /// Actor back to the start cell after a crossing
    Relocate,
    /// Status line back to the idle prompt
    MessageRevert,
    /// Resume after a non-fatal hazard hit
    CollisionRecovery,
    /// Leaderboard step, then restart
    GameOver,
}

impl TimerKind {
    pub const ALL: [TimerKind; 6] = [
        TimerKind::Difficulty,
        TimerKind::SlowMotion,
        TimerKind::Relocate,
        TimerKind::MessageRevert,
        TimerKind::CollisionRecovery,
        TimerKind::GameOver,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::Difficulty => 0,
            TimerKind::SlowMotion => 1,
            TimerKind::Relocate => 2,
            TimerKind::MessageRevert => 3,
            TimerKind::CollisionRecovery => 4,
            TimerKind::GameOver => 5,
        }
    }
}

/// Identifies one scheduling; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Timer table keyed by `TimerKind`
#[derive(Debug, Clone, Default)]
pub struct Timers {
    slots: [Option<Pending>; 6],
    next_handle: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once at `now + delay`, replacing any pending timer of this kind
    pub fn schedule_once(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) -> TimerHandle {
        self.insert(kind, now_ms.saturating_add(delay_ms), None)
    }

    /// Fire every `period` starting at `now + period`, replacing any pending timer of this kind
    pub fn schedule_every(&mut self, kind: TimerKind, now_ms: u64, period_ms: u64) -> TimerHandle {
        let period = period_ms.max(1);
        self.insert(kind, now_ms.saturating_add(period), Some(period))
    }

    fn insert(&mut self, kind: TimerKind, due_ms: u64, period_ms: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.slots[kind.slot()] = Some(Pending {
            handle,
            due_ms,
            period_ms,
        });
        handle
    }

    /// Returns true if a timer was pending
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].take().is_some()
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; 6];
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn due_at(&self, kind: TimerKind) -> Option<u64> {
        self.slots[kind.slot()].map(|p| p.due_ms)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Take the earliest timer due at or before `now`.
    ///
    /// Ties go to the earlier scheduling. One-shot timers are removed; periodic
    /// ones re-arm one period after their own due time so the cadence does not
    /// drift with frame jitter. Returns the kind and the time it was due.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerKind, u64)> {
        let kind = TimerKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.slots[kind.slot()]
                    .filter(|p| p.due_ms <= now_ms)
                    .map(|p| (p.due_ms, p.handle, kind))
            })
            .min_by_key(|&(due, handle, _)| (due, handle))
            .map(|(_, _, kind)| kind)?;

        let slot = &mut self.slots[kind.slot()];
        let pending = (*slot)?;
        match pending.period_ms {
            Some(period) => {
                *slot = Some(Pending {
                    due_ms: pending.due_ms.saturating_add(period),
                    ..pending
                });
            }
            None => *slot = None,
        }
        Some((kind, pending.due_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut Timers, now: u64) -> Vec<(TimerKind, u64)> {
        std::iter::from_fn(|| timers.pop_due(now)).collect()
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let mut timers = Timers::new();
        timers.schedule_once(TimerKind::Relocate, 0, 500);

        assert!(drain(&mut timers, 499).is_empty());
        assert_eq!(drain(&mut timers, 500), vec![(TimerKind::Relocate, 500)]);
        assert!(drain(&mut timers, 10_000).is_empty());
        assert!(!timers.is_scheduled(TimerKind::Relocate));
    }

    #[test]
    fn test_reschedule_replaces_pending() {
        let mut timers = Timers::new();
        let first = timers.schedule_once(TimerKind::MessageRevert, 0, 1500);
        let second = timers.schedule_once(TimerKind::MessageRevert, 1000, 1500);
        assert_ne!(first, second);
        assert_eq!(timers.pending_count(), 1);

        assert!(drain(&mut timers, 1500).is_empty());
        assert_eq!(drain(&mut timers, 2500), vec![(TimerKind::MessageRevert, 2500)]);
    }

    #[test]
    fn test_periodic_catches_up_on_its_own_cadence() {
        let mut timers = Timers::new();
        timers.schedule_every(TimerKind::SlowMotion, 0, 10);

        let fired = drain(&mut timers, 35);
        assert_eq!(
            fired.iter().map(|f| f.1).collect::<Vec<_>>(),
            vec![10, 20, 30]
        );
        assert_eq!(timers.due_at(TimerKind::SlowMotion), Some(40));
    }

    #[test]
    fn test_due_order_then_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule_once(TimerKind::MessageRevert, 0, 100);
        timers.schedule_once(TimerKind::Relocate, 0, 100);
        timers.schedule_once(TimerKind::GameOver, 0, 50);

        let kinds: Vec<_> = drain(&mut timers, 100).into_iter().map(|f| f.0).collect();
        assert_eq!(
            kinds,
            vec![TimerKind::GameOver, TimerKind::MessageRevert, TimerKind::Relocate]
        );
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.schedule_every(TimerKind::Difficulty, 0, 1000);
        timers.schedule_once(TimerKind::CollisionRecovery, 0, 1500);
        assert!(timers.cancel(TimerKind::Difficulty));
        assert!(!timers.cancel(TimerKind::Difficulty));
        timers.cancel_all();
        assert_eq!(timers.pending_count(), 0);
        assert!(drain(&mut timers, u64::MAX).is_empty());
    }
}
