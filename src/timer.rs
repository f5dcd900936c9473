//! One-shot timer slot driven by explicit instants.
//!
//! The slot owns at most one armed timer. Arming replaces whatever was armed
//! before, so a stale deadline can never fire into a later round.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Pacing delay before the next threat is drawn
    RoundStart,
    /// Failure deadline for the active threat
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub fires_at: Instant,
}

impl ArmedTimer {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.fires_at.saturating_duration_since(now)
    }
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer firing `after` from `now`, cancelling any armed one
    pub fn arm(&mut self, kind: TimerKind, now: Instant, after: Duration) -> TimerId {
        self.cancel();
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.armed = Some(ArmedTimer {
            id,
            kind,
            fires_at: now + after,
        });
        log::debug!("timer #{} armed: {:?} in {}ms", id.0, kind, after.as_millis());
        id
    }

    /// Returns true if a timer was actually cancelled
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(t) => {
                log::debug!("timer #{} cancelled: {:?}", t.id.0, t.kind);
                true
            }
            None => false,
        }
    }

    /// Fire the armed timer if it is due. A fired timer is disarmed.
    pub fn poll(&mut self, now: Instant) -> Option<ArmedTimer> {
        match self.armed {
            Some(t) if now >= t.fires_at => {
                self.armed = None;
                log::debug!("timer #{} fired: {:?}", t.id.0, t.kind);
                Some(t)
            }
            _ => None,
        }
    }

    pub fn armed(&self) -> Option<&ArmedTimer> {
        self.armed.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_once_when_due() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(TimerKind::Deadline, t0, ms(100));

        assert!(slot.poll(t0 + ms(99)).is_none());
        assert!(slot.is_armed());

        let fired = slot.poll(t0 + ms(100)).unwrap();
        assert_eq!(fired.kind, TimerKind::Deadline);
        assert!(!slot.is_armed());
        assert!(slot.poll(t0 + ms(500)).is_none());
    }

    #[test]
    fn arming_replaces_previous_timer() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        let first = slot.arm(TimerKind::Deadline, t0, ms(50));
        let second = slot.arm(TimerKind::RoundStart, t0, ms(200));

        assert_ne!(first, second);
        // the replaced deadline must not fire at its old time
        assert!(slot.poll(t0 + ms(60)).is_none());
        let fired = slot.poll(t0 + ms(200)).unwrap();
        assert_eq!(fired.id, second);
        assert_eq!(fired.kind, TimerKind::RoundStart);
    }

    #[test]
    fn cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        assert!(!slot.cancel());
        slot.arm(TimerKind::Deadline, t0, ms(10));
        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert!(slot.poll(t0 + ms(1000)).is_none());
    }

    #[test]
    fn zero_delay_fires_immediately() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(TimerKind::RoundStart, t0, Duration::ZERO);
        assert!(slot.poll(t0).is_some());
    }

    #[test]
    fn remaining_saturates() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::new();
        slot.arm(TimerKind::Deadline, t0, ms(300));
        let armed = *slot.armed().unwrap();
        assert_eq!(armed.remaining(t0 + ms(100)), ms(200));
        assert_eq!(armed.remaining(t0 + ms(400)), Duration::ZERO);
    }
}
