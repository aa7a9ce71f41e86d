use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One row of the base reward table: at least `minutes` studied earns `coins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardStep {
    pub minutes: u64,
    pub coins: u32,
}

impl RewardStep {
    pub const fn new(minutes: u64, coins: u32) -> Self {
        Self { minutes, coins }
    }
}

/// Monotonic step table keyed by minute thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    pub steps: Vec<RewardStep>,
    /// Paid when the elapsed time is below the smallest threshold.
    #[serde(default)]
    pub minimum_reward: u32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            steps: vec![
                RewardStep::new(10, 10),
                RewardStep::new(15, 15),
                RewardStep::new(20, 20),
                RewardStep::new(30, 30),
                RewardStep::new(45, 45),
                RewardStep::new(60, 60),
            ],
            minimum_reward: 0,
        }
    }
}

impl RewardTable {
    pub fn new(steps: Vec<RewardStep>, minimum_reward: u32) -> Self {
        Self {
            steps,
            minimum_reward,
        }
    }

    /// Thresholds must be strictly increasing and rewards non-decreasing,
    /// starting from at least `minimum_reward`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.is_empty() {
            return Err(ValidationError::EmptyCollection("reward steps".into()));
        }
        let mut prev: Option<RewardStep> = None;
        for step in &self.steps {
            if let Some(p) = prev {
                if step.minutes <= p.minutes {
                    return Err(ValidationError::InvalidValue {
                        field: "rewards.steps".into(),
                        message: format!(
                            "thresholds must increase ({} min follows {} min)",
                            step.minutes, p.minutes
                        ),
                    });
                }
                if step.coins < p.coins {
                    return Err(ValidationError::InvalidValue {
                        field: "rewards.steps".into(),
                        message: format!("reward for {} min decreases", step.minutes),
                    });
                }
            } else if step.coins < self.minimum_reward {
                return Err(ValidationError::InvalidValue {
                    field: "rewards.minimum_reward".into(),
                    message: "minimum reward exceeds the first step".into(),
                });
            }
            prev = Some(*step);
        }
        Ok(())
    }

    /// Coins for the highest threshold not above `elapsed_minutes`.
    pub fn base_reward(&self, elapsed_minutes: u64) -> u32 {
        self.steps
            .iter()
            .rev()
            .find(|s| s.minutes <= elapsed_minutes)
            .map(|s| s.coins)
            .unwrap_or(self.minimum_reward)
    }
}
