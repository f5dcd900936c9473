use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DifficultyId {
    Easy,
    #[default]
    Normal,
    Hard,
    Hell,
}

impl DifficultyId {
    /// Next preset in menu order, wrapping around
    pub fn next(self) -> Self {
        let idx = self.position();
        DIFFICULTIES[(idx + 1) % DIFFICULTIES.len()].id
    }

    pub fn prev(self) -> Self {
        let idx = self.position();
        DIFFICULTIES[(idx + DIFFICULTIES.len() - 1) % DIFFICULTIES.len()].id
    }

    fn position(self) -> usize {
        DIFFICULTIES
            .iter()
            .position(|d| d.id == self)
            .unwrap_or(0)
    }

    pub fn profile(self) -> &'static DifficultyProfile {
        DifficultyProfile::get(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub id: DifficultyId,
    pub label: &'static str,
    /// Multiplier on a threat's base window; below 1.0 means less time
    pub speed_factor: f64,
    /// Points per cleared round
    pub score_multiplier: u32,
}

pub static DIFFICULTIES: [DifficultyProfile; 4] = [
    DifficultyProfile {
        id: DifficultyId::Easy,
        label: "新兵 (简单)",
        speed_factor: 1.5,
        score_multiplier: 1,
    },
    DifficultyProfile {
        id: DifficultyId::Normal,
        label: "老手 (普通)",
        speed_factor: 1.0,
        score_multiplier: 2,
    },
    DifficultyProfile {
        id: DifficultyId::Hard,
        label: "大侠 (困难)",
        speed_factor: 0.7,
        score_multiplier: 3,
    },
    DifficultyProfile {
        id: DifficultyId::Hell,
        label: "修罗 (炼狱)",
        speed_factor: 0.5,
        score_multiplier: 5,
    },
];

impl DifficultyProfile {
    pub fn get(id: DifficultyId) -> &'static DifficultyProfile {
        match id {
            DifficultyId::Easy => &DIFFICULTIES[0],
            DifficultyId::Normal => &DIFFICULTIES[1],
            DifficultyId::Hard => &DIFFICULTIES[2],
            DifficultyId::Hell => &DIFFICULTIES[3],
        }
    }
}
