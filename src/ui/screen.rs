use ratatui::Frame;

use crate::{
    app::{App, AppState},
    ui::reaction_stats::render_reaction_stats,
};

/// A UI Screen boundary
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Idle, playing and game-over views share the dojo widget
pub struct DojoScreen;

impl Screen for DojoScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ReactionStatsScreen;

impl Screen for ReactionStatsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_reaction_stats(app, f);
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Dojo => Box::new(DojoScreen),
        AppState::ReactionStats => Box::new(ReactionStatsScreen),
    }
}
