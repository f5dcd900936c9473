// Library surface for headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod judge;
pub mod logging;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod summary;
pub mod threat;
pub mod timer;
pub mod ui;

pub use app::{App, AppState, Control, RuntimeSettings, SortBy, StatsViewState};
