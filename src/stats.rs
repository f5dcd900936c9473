use chrono::{DateTime, Local};
use rusqlite::{params, types::Type, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyId;
use crate::judge::Response;
use crate::session::RoundRecord;
use crate::threat::Category;

/// One resolved round as stored in the reaction log
#[derive(Debug, Clone)]
pub struct RoundStat {
    pub threat: String,
    pub category: Category,
    /// None when the round timed out
    pub submitted: Option<Category>,
    pub success: bool,
    pub reaction_ms: u64,
    pub window_ms: u64,
    pub difficulty: DifficultyId,
    pub timestamp: DateTime<Local>,
}

impl From<&RoundRecord> for RoundStat {
    fn from(record: &RoundRecord) -> Self {
        Self {
            threat: record.threat.name.to_string(),
            category: record.threat.category,
            submitted: match record.response {
                Response::Action(c) => Some(c),
                Response::Timeout => None,
            },
            success: record.verdict.is_success(),
            reaction_ms: record.reaction.as_millis() as u64,
            window_ms: record.window.as_millis() as u64,
            difficulty: record.difficulty,
            timestamp: Local::now(),
        }
    }
}

/// Aggregate for one threat across every logged session
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatSummary {
    pub threat: String,
    pub category: Category,
    /// Average over successful rounds only
    pub avg_reaction_ms: Option<f64>,
    pub miss_rate: f64,
    pub attempts: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub avg_reaction_ms: Option<f64>,
    pub miss_rate: f64,
    pub attempts: i64,
}

/// SQLite-backed reaction log
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Open the log at its default location
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("dbm_dojo_stats.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS round_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                threat TEXT NOT NULL,
                category TEXT NOT NULL,
                submitted TEXT,
                success BOOLEAN NOT NULL,
                reaction_ms INTEGER NOT NULL,
                window_ms INTEGER NOT NULL,
                difficulty TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_round_stats_threat ON round_stats(threat)",
            [],
        )?;

        Ok(StatsDb { conn })
    }

    pub fn record_round(&self, stat: &RoundStat) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO round_stats
            (threat, category, submitted, success, reaction_ms, window_ms, difficulty, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                stat.threat,
                stat.category.to_string(),
                stat.submitted.map(|c| c.to_string()),
                stat.success,
                stat.reaction_ms,
                stat.window_ms,
                stat.difficulty.to_string(),
                stat.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn total_rounds(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM round_stats", [], |row| row.get(0))
    }

    /// Per-threat averages, ordered by threat name
    pub fn threat_summary(&self) -> Result<Vec<ThreatSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                threat,
                category,
                AVG(CASE WHEN success = 1 THEN reaction_ms END) as avg_ms,
                COUNT(*) as attempts,
                SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END) as misses
            FROM round_stats
            GROUP BY threat, category
            ORDER BY threat
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let attempts: i64 = row.get(3)?;
            let misses: i64 = row.get(4)?;
            Ok(ThreatSummary {
                threat: row.get(0)?,
                category: category_column(row, 1)?,
                avg_reaction_ms: row.get(2)?,
                miss_rate: miss_rate(misses, attempts),
                attempts,
            })
        })?;

        let summary = rows.collect::<Result<Vec<_>>>()?;
        Ok(summary)
    }

    pub fn category_summary(&self) -> Result<Vec<CategorySummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                category,
                AVG(CASE WHEN success = 1 THEN reaction_ms END) as avg_ms,
                COUNT(*) as attempts,
                SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END) as misses
            FROM round_stats
            GROUP BY category
            "#,
        )?;

        let mut summary = stmt
            .query_map([], |row| {
                let attempts: i64 = row.get(2)?;
                let misses: i64 = row.get(3)?;
                Ok(CategorySummary {
                    category: category_column(row, 0)?,
                    avg_reaction_ms: row.get(1)?,
                    miss_rate: miss_rate(misses, attempts),
                    attempts,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        summary.sort_by_key(|s| s.category.index());
        Ok(summary)
    }

    pub fn clear_all_stats(&self) -> Result<()> {
        self.conn.execute("DELETE FROM round_stats", [])?;
        Ok(())
    }
}

fn category_column(row: &rusqlite::Row, idx: usize) -> Result<Category> {
    let raw: String = row.get(idx)?;
    Category::parse(&raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, "category".to_string(), Type::Text))
}

fn miss_rate(misses: i64, attempts: i64) -> f64 {
    if attempts > 0 {
        misses as f64 / attempts as f64 * 100.0
    } else {
        0.0
    }
}
