use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dbm_dojo::{
    app::{App, Control, RuntimeSettings},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::DifficultyId,
    logging,
    runtime::{CrosstermEventSource, DojoEvent, FixedTicker, Runner},
    stats::StatsDb,
    ui::screen::current_screen,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};

/// reaction trainer for boss-fight mechanics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reaction trainer: a boss skill appears, you pick the right counter before the countdown runs out. One mistake ends the run."
)]
pub struct Cli {
    /// difficulty to preselect (defaults to the last one played)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<DifficultyId>,

    /// do not highlight the correct response
    #[clap(long)]
    no_hints: bool,

    /// do not record rounds in the reaction log
    #[clap(long)]
    no_stats: bool,

    /// milliseconds before the first threat of a run
    #[clap(long)]
    initial_delay_ms: Option<u64>,

    /// milliseconds between a correct response and the next threat
    #[clap(long)]
    round_delay_ms: Option<u64>,

    /// seed the threat draw for a repeatable run
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Overlay command line flags on the saved config
    fn settings(&self, cfg: &Config) -> RuntimeSettings {
        let mut settings = RuntimeSettings::from(cfg);
        if let Some(d) = self.difficulty {
            settings.difficulty = d;
        }
        if self.no_hints {
            settings.hints = false;
        }
        if self.no_stats {
            settings.record_stats = false;
        }
        if let Some(ms) = self.initial_delay_ms {
            settings.pacing.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.round_delay_ms {
            settings.pacing.round_delay = Duration::from_millis(ms);
        }
        settings.seed = self.seed;
        settings
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init(AppDirs::log_path().as_deref());

    let store = FileConfigStore::new();
    let saved = store.load();
    let settings = cli.settings(&saved);

    let stats_db = if settings.record_stats {
        match StatsDb::new() {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!("reaction log unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut app = App::new(settings, stats_db);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.teardown();

    let cfg = config_to_save(saved, &app.settings);
    if let Err(e) = store.save(&cfg) {
        log::warn!("could not save config {}: {}", store.path().display(), e);
    }

    result
}

/// Remember the last difficulty and hint choice. Pacing and stats flags given on
/// the command line only apply to this run, so the file keeps its own.
fn config_to_save(saved: Config, settings: &RuntimeSettings) -> Config {
    Config {
        difficulty: settings.difficulty,
        hints: settings.hints,
        ..saved
    }
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| current_screen(&app.state).render(app, f))?;

        let now = Instant::now();
        // deadlines are checked on every event so a stream of keys cannot starve them
        app.on_tick(now);
        match runner.step() {
            DojoEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == Control::Quit {
                    break;
                }
            }
            DojoEvent::Resize => terminal.autoresize()?,
            DojoEvent::Tick => app.on_tick(Instant::now()),
        }
    }

    Ok(())
}
