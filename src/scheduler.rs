use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::time::{Duration, Instant};

use crate::difficulty::DifficultyProfile;
use crate::threat::{Threat, THREATS};
use crate::timer::{TimerKind, TimerSlot};

/// Each point of score shaves 2% off the window...
const PROGRESSIVE_STEP: f64 = 0.02;
/// ...down to this floor
const PROGRESSIVE_FLOOR: f64 = 0.6;

/// Delays between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Before the first threat of a session
    pub initial_delay: Duration,
    /// After a cleared round
    pub round_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            round_delay: Duration::from_millis(800),
        }
    }
}

pub fn progressive_factor(score: u32) -> f64 {
    (1.0 - score as f64 * PROGRESSIVE_STEP).max(PROGRESSIVE_FLOOR)
}

/// Time the player gets for `threat`, rounded to whole milliseconds
pub fn effective_window(threat: &Threat, difficulty: &DifficultyProfile, score: u32) -> Duration {
    let ms =
        threat.base_window_ms as f64 * difficulty.speed_factor * progressive_factor(score);
    Duration::from_millis(ms.round() as u64)
}

/// A drawn threat waiting for an answer
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRound {
    /// 1-based within the session
    pub number: u32,
    pub threat: &'static Threat,
    pub window: Duration,
    pub shown_at: Instant,
    pub deadline: Instant,
}

impl ActiveRound {
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// 1.0 when just shown, 0.0 at the deadline
    pub fn remaining_ratio(&self, now: Instant) -> f64 {
        if self.window.is_zero() {
            return 0.0;
        }
        (self.remaining(now).as_secs_f64() / self.window.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn reaction_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.shown_at)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// Pacing delay elapsed; a new threat is live and its deadline armed
    RoundArmed(ActiveRound),
    /// The active threat was not answered in time
    DeadlineExpired,
}

/// Picks threats and owns the session's only timer
#[derive(Debug)]
pub struct RoundScheduler {
    timer: TimerSlot,
    rng: StdRng,
    pacing: Pacing,
    rounds_armed: u32,
}

impl RoundScheduler {
    pub fn new(pacing: Pacing) -> Self {
        Self::with_rng(pacing, StdRng::from_entropy())
    }

    pub fn with_seed(pacing: Pacing, seed: u64) -> Self {
        Self::with_rng(pacing, StdRng::seed_from_u64(seed))
    }

    fn with_rng(pacing: Pacing, rng: StdRng) -> Self {
        Self {
            timer: TimerSlot::new(),
            rng,
            pacing,
            rounds_armed: 0,
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Schedule the next threat to appear `after` from `now`
    pub fn arm_round(&mut self, after: Duration, now: Instant) {
        self.timer.arm(TimerKind::RoundStart, now, after);
    }

    /// Drop any pending timer. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    /// Forget the round counter, for a fresh session
    pub fn reset(&mut self) {
        self.cancel();
        self.rounds_armed = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn pending(&self) -> Option<TimerKind> {
        self.timer.armed().map(|t| t.kind)
    }

    /// Advance to `now`. `score` and `difficulty` size the window of a newly
    /// drawn threat.
    pub fn poll(
        &mut self,
        now: Instant,
        score: u32,
        difficulty: &DifficultyProfile,
    ) -> Option<SchedulerEvent> {
        let fired = self.timer.poll(now)?;
        match fired.kind {
            TimerKind::Deadline => Some(SchedulerEvent::DeadlineExpired),
            TimerKind::RoundStart => {
                let threat = THREATS.choose(&mut self.rng)?;
                let window = effective_window(threat, difficulty, score);
                self.rounds_armed += 1;
                // the deadline runs from when the threat is shown, not from
                // when the pacing timer was due
                self.timer.arm(TimerKind::Deadline, now, window);
                log::debug!(
                    "round {}: {} ({}) window {}ms",
                    self.rounds_armed,
                    threat.name,
                    threat.category,
                    window.as_millis()
                );
                Some(SchedulerEvent::RoundArmed(ActiveRound {
                    number: self.rounds_armed,
                    threat,
                    window,
                    shown_at: now,
                    deadline: now + window,
                }))
            }
        }
    }
}
