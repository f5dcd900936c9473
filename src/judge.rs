use crate::difficulty::DifficultyProfile;
use crate::scheduler::ActiveRound;
use crate::threat::{Category, Threat};

/// What the player did about the active threat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Action(Category),
    /// Deadline passed; never matches any category
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    WrongResponse(Category),
    TooSlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success { delta: u32 },
    Failure { cause: FailureCause },
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success { .. })
    }

    pub fn feedback(&self, threat: &Threat) -> String {
        match self {
            Verdict::Success { delta } => format!("完美应对！(+{delta})"),
            Verdict::Failure {
                cause: FailureCause::WrongResponse(_),
            } => format!("操作失误！被{}击败。", threat.name),
            Verdict::Failure {
                cause: FailureCause::TooSlow,
            } => "反应过慢，挑战失败！".to_string(),
        }
    }
}

pub fn judge(round: &ActiveRound, response: Response, difficulty: &DifficultyProfile) -> Verdict {
    match response {
        Response::Action(category) if category == round.threat.category => Verdict::Success {
            delta: difficulty.score_multiplier,
        },
        Response::Action(category) => Verdict::Failure {
            cause: FailureCause::WrongResponse(category),
        },
        Response::Timeout => Verdict::Failure {
            cause: FailureCause::TooSlow,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyId;
    use crate::threat::find_threat;
    use std::time::{Duration, Instant};

    fn round_for(name: &str) -> ActiveRound {
        let t0 = Instant::now();
        ActiveRound {
            number: 1,
            threat: find_threat(name).unwrap(),
            window: Duration::from_millis(1000),
            shown_at: t0,
            deadline: t0 + Duration::from_millis(1000),
        }
    }

    #[test]
    fn matching_category_scores_multiplier() {
        let round = round_for("断魂刺");
        for d in &crate::difficulty::DIFFICULTIES {
            let verdict = judge(&round, Response::Action(Category::Dodge), d);
            assert_eq!(
                verdict,
                Verdict::Success {
                    delta: d.score_multiplier
                }
            );
        }
    }

    #[test]
    fn exactly_one_category_succeeds() {
        let hard = DifficultyProfile::get(DifficultyId::Hard);
        for threat in crate::threat::THREATS {
            let round = round_for(threat.name);
            let wins = Category::ALL
                .iter()
                .filter(|c| judge(&round, Response::Action(**c), hard).is_success())
                .count();
            assert_eq!(wins, 1, "{}", threat.name);
        }
    }

    #[test]
    fn timeout_always_fails() {
        let round = round_for("虚弱状态");
        let easy = DifficultyProfile::get(DifficultyId::Easy);
        assert_eq!(
            judge(&round, Response::Timeout, easy),
            Verdict::Failure {
                cause: FailureCause::TooSlow
            }
        );
    }

    #[test]
    fn feedback_texts() {
        let threat = find_threat("风来吴山").unwrap();
        assert_eq!(
            Verdict::Success { delta: 3 }.feedback(threat),
            "完美应对！(+3)"
        );
        assert_eq!(
            Verdict::Failure {
                cause: FailureCause::WrongResponse(Category::Burst)
            }
            .feedback(threat),
            "操作失误！被风来吴山击败。"
        );
        assert_eq!(
            Verdict::Failure {
                cause: FailureCause::TooSlow
            }
            .feedback(threat),
            "反应过慢，挑战失败！"
        );
    }
}
