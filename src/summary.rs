use std::time::Duration;

/// Aggregate of one play-through, shown on the game-over panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub rounds_cleared: usize,
    pub mean_reaction_ms: Option<f64>,
    pub std_dev_ms: Option<f64>,
    pub fastest_ms: Option<f64>,
}

impl RunSummary {
    pub fn from_reactions(reactions: &[Duration]) -> Self {
        let samples: Vec<f64> = reactions
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();

        Self {
            rounds_cleared: samples.len(),
            mean_reaction_ms: mean(&samples),
            std_dev_ms: std_dev(&samples),
            fastest_ms: samples.iter().copied().reduce(f64::min),
        }
    }

    pub fn describe(&self) -> String {
        match (self.mean_reaction_ms, self.fastest_ms, self.std_dev_ms) {
            (Some(avg), Some(best), Some(sd)) => format!(
                "{} 轮   平均 {:.0}ms   最快 {:.0}ms   波动 {:.0}ms",
                self.rounds_cleared, avg, best, sd
            ),
            _ => format!("{} 轮", self.rounds_cleared),
        }
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let avg = mean(data)?;
    let variance = data.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
