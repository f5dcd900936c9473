use std::time::{Duration, Instant};

use crate::difficulty::{DifficultyId, DifficultyProfile};
use crate::judge::{judge, Response, Verdict};
use crate::scheduler::{ActiveRound, Pacing, RoundScheduler, SchedulerEvent};
use crate::summary::RunSummary;
use crate::threat::{Category, Threat};

pub const READY_FEEDBACK: &str = "准备战斗！";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    GameOver,
}

/// Everything the view needs to draw the dojo
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub score: u32,
    /// Best score since the process started
    pub high_score: u32,
    /// The run that just ended beat the previous best (ties do not count)
    pub new_best: bool,
    pub active_round: Option<ActiveRound>,
    pub feedback: String,
    pub difficulty: &'static DifficultyProfile,
    /// Reaction times of cleared rounds this session
    pub reactions: Vec<Duration>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            score: 0,
            high_score: 0,
            new_best: false,
            active_round: None,
            feedback: String::new(),
            difficulty: DifficultyProfile::get(DifficultyId::default()),
            reactions: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn active_threat(&self) -> Option<&'static Threat> {
        self.active_round.as_ref().map(|r| r.threat)
    }
}

/// One resolved round, for the reaction log
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub number: u32,
    pub threat: &'static Threat,
    pub response: Response,
    pub verdict: Verdict,
    pub reaction: Duration,
    pub window: Duration,
    pub difficulty: DifficultyId,
    /// Score after the round was applied
    pub score: u32,
}

/// Idle -> Playing -> GameOver state machine around a round scheduler
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    scheduler: RoundScheduler,
}

impl Session {
    pub fn new(pacing: Pacing) -> Self {
        Self::with_scheduler(RoundScheduler::new(pacing))
    }

    /// Deterministic threat order, for tests and `--seed`
    pub fn with_seed(pacing: Pacing, seed: u64) -> Self {
        Self::with_scheduler(RoundScheduler::with_seed(pacing, seed))
    }

    fn with_scheduler(scheduler: RoundScheduler) -> Self {
        Self {
            state: SessionState::default(),
            scheduler,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn pacing(&self) -> Pacing {
        self.scheduler.pacing()
    }

    /// Number of live timers: 0 or 1
    pub fn armed_timers(&self) -> usize {
        usize::from(self.scheduler.is_armed())
    }

    /// Time left on the active threat
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.state.active_round.as_ref().map(|r| r.remaining(now))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_reactions(&self.state.reactions)
    }

    /// Begin a fresh session. Also the restart path from GameOver.
    pub fn start(&mut self, difficulty: &'static DifficultyProfile, now: Instant) {
        if self.state.phase == Phase::Playing {
            log::warn!("start ignored: session already playing");
            return;
        }

        self.scheduler.reset();
        self.state.difficulty = difficulty;
        self.state.score = 0;
        self.state.new_best = false;
        self.state.active_round = None;
        self.state.reactions.clear();
        self.state.feedback = READY_FEEDBACK.to_string();
        self.state.phase = Phase::Playing;
        self.scheduler.arm_round(self.scheduler.pacing().initial_delay, now);
        log::info!("session started on {}", difficulty.id);
    }

    /// Abort a running session or leave the game-over panel
    pub fn stop(&mut self) {
        if self.state.phase == Phase::Idle {
            return;
        }
        self.scheduler.cancel();
        self.state.active_round = None;
        if self.state.phase == Phase::Playing {
            log::info!("session stopped at score {}", self.state.score);
        }
        self.state.phase = Phase::Idle;
    }

    /// Player answered with `category`. Stray input is ignored.
    pub fn submit(&mut self, category: Category, now: Instant) -> Option<RoundRecord> {
        if self.state.phase != Phase::Playing {
            return None;
        }
        let deadline = self.state.active_round.as_ref()?.deadline;
        if now >= deadline {
            // the deadline won the race against this key press
            self.scheduler.cancel();
            return self.resolve(Response::Timeout, now);
        }
        self.resolve(Response::Action(category), now)
    }

    /// Advance timers to `now`
    pub fn tick(&mut self, now: Instant) -> Option<RoundRecord> {
        if self.state.phase != Phase::Playing {
            return None;
        }
        match self
            .scheduler
            .poll(now, self.state.score, self.state.difficulty)?
        {
            SchedulerEvent::RoundArmed(round) => {
                self.state.active_round = Some(round);
                None
            }
            SchedulerEvent::DeadlineExpired => self.resolve(Response::Timeout, now),
        }
    }

    fn resolve(&mut self, response: Response, now: Instant) -> Option<RoundRecord> {
        let round = self.state.active_round.take()?;
        let verdict = judge(&round, response, self.state.difficulty);
        let reaction = match response {
            Response::Timeout => round.window,
            Response::Action(_) => round.reaction_time(now),
        };

        self.scheduler.cancel();
        self.state.feedback = verdict.feedback(round.threat);

        match verdict {
            Verdict::Success { delta } => {
                self.state.score = self.state.score.saturating_add(delta);
                self.state.reactions.push(reaction);
                self.scheduler
                    .arm_round(self.scheduler.pacing().round_delay, now);
            }
            Verdict::Failure { cause } => {
                self.state.new_best = self.state.score > self.state.high_score;
                self.state.high_score = self.state.high_score.max(self.state.score);
                self.state.phase = Phase::GameOver;
                log::info!(
                    "game over on round {} ({}, {:?}), score {}, best {}",
                    round.number,
                    round.threat.name,
                    cause,
                    self.state.score,
                    self.state.high_score
                );
            }
        }

        Some(RoundRecord {
            number: round.number,
            threat: round.threat,
            response,
            verdict,
            reaction,
            window: round.window,
            difficulty: self.state.difficulty.id,
            score: self.state.score,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Pacing::default())
    }
}
