use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Tick often enough for a smooth countdown bar; the shortest window is a few
/// hundred milliseconds.
pub const TICK_RATE_MS: u64 = 25;

/// Everything the dojo's event loop reacts to
#[derive(Clone, Debug)]
pub enum DojoEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal input
pub trait DojoEventSource: Send + 'static {
    /// Wait up to `timeout` for input; `Err(Timeout)` when nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<DojoEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DojoEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => DojoEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => DojoEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("terminal input failed: {}", e);
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DojoEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DojoEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless tests
pub struct TestEventSource {
    rx: Receiver<DojoEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DojoEvent>) -> Self {
        Self { rx }
    }
}

impl DojoEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DojoEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the loop one event at a time, or a Tick when input is quiet
pub struct Runner<E: DojoEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: DojoEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> DojoEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                DojoEvent::Tick
            }
        }
    }
}
