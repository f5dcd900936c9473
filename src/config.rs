use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyId;
use crate::scheduler::Pacing;

/// User preferences persisted between runs. The high score is not one of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: DifficultyId,
    pub hints: bool,
    pub record_stats: bool,
    pub initial_delay_ms: u64,
    pub round_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            difficulty: DifficultyId::default(),
            hints: true,
            record_stats: true,
            initial_delay_ms: pacing.initial_delay.as_millis() as u64,
            round_delay_ms: pacing.round_delay.as_millis() as u64,
        }
    }
}

impl Config {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            round_delay: Duration::from_millis(self.round_delay_ms),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("dbm_dojo_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring bad config {}: {}", self.path.display(), e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
