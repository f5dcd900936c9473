use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use itertools::Itertools;
use std::cmp::Ordering;
use std::time::Instant;

use crate::config::Config;
use crate::difficulty::DifficultyId;
use crate::scheduler::Pacing;
use crate::session::{Phase, RoundRecord, Session};
use crate::stats::{CategorySummary, RoundStat, StatsDb, ThreatSummary};
use crate::threat::Category;

/// Settings in effect for this run (config file overlaid with CLI flags)
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub difficulty: DifficultyId,
    pub hints: bool,
    pub record_stats: bool,
    pub pacing: Pacing,
    pub seed: Option<u64>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RuntimeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            difficulty: cfg.difficulty,
            hints: cfg.hints,
            record_stats: cfg.record_stats,
            pacing: cfg.pacing(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Dojo,
    ReactionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Threat,
    Reaction,
    MissRate,
    Attempts,
}

#[derive(Debug)]
pub struct StatsViewState {
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    pub sort_ascending: bool,
    pub threats: Vec<ThreatSummary>,
    pub categories: Vec<CategorySummary>,
    /// `c` was pressed and the next key decides whether the log is wiped
    pub confirm_clear: bool,
}

impl Default for StatsViewState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            sort_by: SortBy::Threat,
            sort_ascending: true,
            threats: Vec::new(),
            categories: Vec::new(),
            confirm_clear: false,
        }
    }
}

impl StatsViewState {
    pub fn sorted_threats(&self) -> Vec<&ThreatSummary> {
        // rows without a successful answer sort as slowest
        let reaction = |s: &ThreatSummary| s.avg_reaction_ms.unwrap_or(f64::INFINITY);
        self.threats
            .iter()
            .sorted_by(|a, b| {
                let cmp = match self.sort_by {
                    SortBy::Threat => a
                        .category
                        .index()
                        .cmp(&b.category.index())
                        .then_with(|| a.threat.cmp(&b.threat)),
                    SortBy::Reaction => reaction(a)
                        .partial_cmp(&reaction(b))
                        .unwrap_or(Ordering::Equal),
                    SortBy::MissRate => a
                        .miss_rate
                        .partial_cmp(&b.miss_rate)
                        .unwrap_or(Ordering::Equal),
                    SortBy::Attempts => a.attempts.cmp(&b.attempts),
                };
                if self.sort_ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            })
            .collect()
    }

    fn sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
        self.scroll_offset = 0;
    }
}

/// Whether the event loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Presentation-layer controller: turns key presses into session operations
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub state: AppState,
    pub settings: RuntimeSettings,
    pub stats_db: Option<StatsDb>,
    pub stats_view: StatsViewState,
    /// Instant of the latest tick or key, used for rendering countdowns
    pub now: Instant,
    pub last_round: Option<RoundRecord>,
}

impl App {
    pub fn new(settings: RuntimeSettings, stats_db: Option<StatsDb>) -> Self {
        let session = match settings.seed {
            Some(seed) => Session::with_seed(settings.pacing, seed),
            None => Session::new(settings.pacing),
        };
        let stats_db = if settings.record_stats {
            stats_db
        } else {
            None
        };

        Self {
            session,
            state: AppState::Dojo,
            settings,
            stats_db,
            stats_view: StatsViewState::default(),
            now: Instant::now(),
            last_round: None,
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.now = now;
        if let Some(record) = self.session.tick(now) {
            self.record(record);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }
        self.now = now;

        match self.state {
            AppState::Dojo => match self.session.phase() {
                Phase::Idle => self.on_idle_key(key, now),
                Phase::Playing => self.on_playing_key(key, now),
                Phase::GameOver => self.on_game_over_key(key, now),
            },
            AppState::ReactionStats => self.on_stats_key(key),
        }
    }

    fn on_idle_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
            KeyCode::Left => self.settings.difficulty = self.settings.difficulty.prev(),
            KeyCode::Right => self.settings.difficulty = self.settings.difficulty.next(),
            KeyCode::Enter | KeyCode::Char(' ') => self.start(now),
            KeyCode::Char('h') => self.settings.hints = !self.settings.hints,
            KeyCode::Char('s') => self.open_stats(),
            _ => {}
        }
        Control::Continue
    }

    fn on_playing_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        match key.code {
            KeyCode::Esc => self.session.stop(),
            code => {
                if let Some(category) = category_for_key(code) {
                    if let Some(record) = self.session.submit(category, now) {
                        self.record(record);
                    }
                }
            }
        }
        Control::Continue
    }

    fn on_game_over_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        match key.code {
            KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('r') | KeyCode::Enter => self.start(now),
            KeyCode::Esc | KeyCode::Char('b') => self.session.stop(),
            KeyCode::Char('s') => self.open_stats(),
            _ => {}
        }
        Control::Continue
    }

    fn on_stats_key(&mut self, key: KeyEvent) -> Control {
        if self.stats_view.confirm_clear {
            self.stats_view.confirm_clear = false;
            if key.code == KeyCode::Char('y') {
                self.clear_stats();
            }
            return Control::Continue;
        }

        let view = &mut self.stats_view;
        match key.code {
            KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
                self.state = AppState::Dojo;
            }
            KeyCode::Up => view.scroll_offset = view.scroll_offset.saturating_sub(1),
            // clamped against the table height when rendering
            KeyCode::Down => view.scroll_offset += 1,
            KeyCode::PageUp => view.scroll_offset = view.scroll_offset.saturating_sub(10),
            KeyCode::PageDown => view.scroll_offset += 10,
            KeyCode::Home => view.scroll_offset = 0,
            KeyCode::Char('1') => view.sort(SortBy::Threat),
            KeyCode::Char('2') => view.sort(SortBy::Reaction),
            KeyCode::Char('3') => view.sort(SortBy::MissRate),
            KeyCode::Char('4') => view.sort(SortBy::Attempts),
            KeyCode::Char(' ') => {
                view.sort_ascending = !view.sort_ascending;
                view.scroll_offset = 0;
            }
            KeyCode::Char('c') if self.stats_db.is_some() => view.confirm_clear = true,
            _ => {}
        }
        Control::Continue
    }

    fn start(&mut self, now: Instant) {
        self.last_round = None;
        self.session.start(self.settings.difficulty.profile(), now);
    }

    fn record(&mut self, record: RoundRecord) {
        if let Some(db) = &self.stats_db {
            if let Err(e) = db.record_round(&RoundStat::from(&record)) {
                log::warn!("reaction log disabled: {}", e);
                self.stats_db = None;
            }
        }
        self.last_round = Some(record);
    }

    pub fn open_stats(&mut self) {
        self.refresh_stats();
        self.stats_view.scroll_offset = 0;
        self.stats_view.confirm_clear = false;
        self.state = AppState::ReactionStats;
    }

    /// Reload summaries from the reaction log
    pub fn refresh_stats(&mut self) {
        let Some(db) = &self.stats_db else {
            self.stats_view.threats.clear();
            self.stats_view.categories.clear();
            return;
        };
        match (db.threat_summary(), db.category_summary()) {
            (Ok(threats), Ok(categories)) => {
                self.stats_view.threats = threats;
                self.stats_view.categories = categories;
            }
            (Err(e), _) | (_, Err(e)) => log::warn!("could not read reaction log: {}", e),
        }
    }

    /// Wipe the reaction log and reload the (now empty) summaries
    pub fn clear_stats(&mut self) {
        if let Some(db) = &self.stats_db {
            match db.clear_all_stats() {
                Ok(()) => log::info!("reaction log cleared"),
                Err(e) => log::warn!("could not clear reaction log: {}", e),
            }
        }
        self.refresh_stats();
        self.stats_view.scroll_offset = 0;
    }

    /// Stop the session before the view goes away
    pub fn teardown(&mut self) {
        self.session.stop();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// `1`-`4`, or the home-row keys `j k l ;`
pub fn category_for_key(code: KeyCode) -> Option<Category> {
    match code {
        KeyCode::Char(c @ '1'..='4') => c.to_digit(10).and_then(|d| Category::from_index(d as usize)),
        KeyCode::Char('j') => Some(Category::Interrupt),
        KeyCode::Char('k') => Some(Category::Dodge),
        KeyCode::Char('l') => Some(Category::Defend),
        KeyCode::Char(';') => Some(Category::Burst),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn test_app() -> App {
        let settings = RuntimeSettings {
            seed: Some(99),
            ..RuntimeSettings::default()
        };
        App::new(settings, StatsDb::open_in_memory().ok())
    }

    fn key_for(category: Category) -> KeyEvent {
        key(KeyCode::Char(
            char::from_digit(category.index() as u32, 10).unwrap(),
        ))
    }

    #[test]
    fn keys_map_to_categories() {
        assert_eq!(category_for_key(KeyCode::Char('1')), Some(Category::Interrupt));
        assert_eq!(category_for_key(KeyCode::Char('4')), Some(Category::Burst));
        assert_eq!(category_for_key(KeyCode::Char('k')), Some(Category::Dodge));
        assert_eq!(category_for_key(KeyCode::Char(';')), Some(Category::Burst));
        assert_eq!(category_for_key(KeyCode::Char('5')), None);
        assert_eq!(category_for_key(KeyCode::Enter), None);
    }

    #[test]
    fn idle_keys_change_settings() {
        let mut app = test_app();
        let t0 = Instant::now();
        assert_eq!(app.settings.difficulty, DifficultyId::Normal);

        app.on_key(key(KeyCode::Right), t0);
        assert_eq!(app.settings.difficulty, DifficultyId::Hard);
        app.on_key(key(KeyCode::Left), t0);
        app.on_key(key(KeyCode::Left), t0);
        assert_eq!(app.settings.difficulty, DifficultyId::Easy);

        assert!(app.settings.hints);
        app.on_key(key(KeyCode::Char('h')), t0);
        assert!(!app.settings.hints);
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn enter_starts_with_selected_difficulty() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Right), t0);
        app.on_key(key(KeyCode::Enter), t0);
        assert_eq!(app.session.phase(), Phase::Playing);
        assert_eq!(app.session.state().difficulty.id, DifficultyId::Hard);
    }

    #[test]
    fn full_round_trip_records_stats() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        app.on_tick(t0 + ms(1000));

        let threat = app.session.state().active_threat().unwrap();
        app.on_key(key_for(threat.category), t0 + ms(1200));
        assert_eq!(app.session.state().score, 2);
        assert!(app.last_round.as_ref().unwrap().verdict.is_success());

        // let the next threat time out
        app.on_tick(t0 + ms(2000));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);
        assert_eq!(app.session.phase(), Phase::GameOver);
        assert_eq!(app.session.state().high_score, 2);

        let db = app.stats_db.as_ref().unwrap();
        assert_eq!(db.total_rounds().unwrap(), 2);
    }

    #[test]
    fn esc_while_playing_stops() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char(' ')), t0);
        app.on_tick(t0 + ms(1000));
        assert_eq!(app.on_key(key(KeyCode::Esc), t0 + ms(1001)), Control::Continue);
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.armed_timers(), 0);
    }

    #[test]
    fn game_over_keys() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        app.on_tick(t0 + ms(1000));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);
        assert_eq!(app.session.phase(), Phase::GameOver);

        app.on_key(key(KeyCode::Char('r')), deadline + ms(10));
        assert_eq!(app.session.phase(), Phase::Playing);
        assert!(app.last_round.is_none());

        app.on_tick(deadline + ms(1010));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);
        app.on_key(key(KeyCode::Char('b')), deadline);
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn quit_keys() {
        let mut app = test_app();
        let t0 = Instant::now();
        assert_eq!(app.on_key(key(KeyCode::Char('q')), t0), Control::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), t0),
            Control::Quit
        );
    }

    #[test]
    fn number_keys_in_idle_do_nothing() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('2')), t0);
        assert_eq!(app.session.phase(), Phase::Idle);
        assert!(app.last_round.is_none());
    }

    #[test]
    fn stats_view_navigation() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('s')), t0);
        assert_eq!(app.state, AppState::ReactionStats);

        app.on_key(key(KeyCode::Down), t0);
        app.on_key(key(KeyCode::Down), t0);
        assert_eq!(app.stats_view.scroll_offset, 2);
        app.on_key(key(KeyCode::Char('3')), t0);
        assert_eq!(app.stats_view.sort_by, SortBy::MissRate);
        assert_eq!(app.stats_view.scroll_offset, 0);
        app.on_key(key(KeyCode::Char(' ')), t0);
        assert!(!app.stats_view.sort_ascending);

        app.on_key(key(KeyCode::Char('b')), t0);
        assert_eq!(app.state, AppState::Dojo);
    }

    #[test]
    fn sorted_threats_orders_missing_reaction_last() {
        let view = StatsViewState {
            sort_by: SortBy::Reaction,
            threats: vec![
                ThreatSummary {
                    threat: "a".into(),
                    category: Category::Dodge,
                    avg_reaction_ms: None,
                    miss_rate: 100.0,
                    attempts: 1,
                },
                ThreatSummary {
                    threat: "b".into(),
                    category: Category::Burst,
                    avg_reaction_ms: Some(420.0),
                    miss_rate: 0.0,
                    attempts: 3,
                },
            ],
            ..StatsViewState::default()
        };
        let names: Vec<_> = view.sorted_threats().iter().map(|s| s.threat.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn clear_key_needs_confirmation() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        app.on_tick(t0 + ms(1000));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        app.on_tick(deadline);
        assert_eq!(app.stats_db.as_ref().unwrap().total_rounds().unwrap(), 1);

        app.on_key(key(KeyCode::Char('s')), deadline);
        assert_eq!(app.stats_view.threats.len(), 1);

        // anything but `y` backs out
        app.on_key(key(KeyCode::Char('c')), deadline);
        assert!(app.stats_view.confirm_clear);
        app.on_key(key(KeyCode::Char('n')), deadline);
        assert!(!app.stats_view.confirm_clear);
        assert_eq!(app.stats_db.as_ref().unwrap().total_rounds().unwrap(), 1);
        assert_eq!(app.state, AppState::ReactionStats);

        app.on_key(key(KeyCode::Char('c')), deadline);
        app.on_key(key(KeyCode::Char('y')), deadline);
        assert!(!app.stats_view.confirm_clear);
        assert_eq!(app.stats_db.as_ref().unwrap().total_rounds().unwrap(), 0);
        assert!(app.stats_view.threats.is_empty());
        assert!(app.stats_view.categories.is_empty());
    }

    #[test]
    fn clear_key_ignored_without_log() {
        let settings = RuntimeSettings {
            record_stats: false,
            ..RuntimeSettings::default()
        };
        let mut app = App::new(settings, None);
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('s')), t0);
        app.on_key(key(KeyCode::Char('c')), t0);
        assert!(!app.stats_view.confirm_clear);
    }

    #[test]
    fn teardown_cancels_live_deadline() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        app.on_tick(t0 + ms(1000));
        let deadline = app.session.state().active_round.as_ref().unwrap().deadline;
        assert_eq!(app.session.armed_timers(), 1);

        app.teardown();
        assert_eq!(app.session.phase(), Phase::Idle);
        assert_eq!(app.session.armed_timers(), 0);
        assert!(app.session.state().active_round.is_none());

        // the cancelled deadline never resolves a round
        app.on_tick(deadline + ms(10_000));
        assert_eq!(app.session.phase(), Phase::Idle);
        assert!(app.last_round.is_none());
        assert_eq!(app.stats_db.as_ref().unwrap().total_rounds().unwrap(), 0);
    }

    #[test]
    fn disabled_stats_drop_the_db() {
        let settings = RuntimeSettings {
            record_stats: false,
            ..RuntimeSettings::default()
        };
        let app = App::new(settings, StatsDb::open_in_memory().ok());
        assert!(app.stats_db.is_none());
    }
}
