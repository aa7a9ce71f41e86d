//! Xavicoin reward computation for finished study sessions.
//!
//! The calculator is a pure function over `(elapsed, cards, goal)`; all
//! business constants (the minute step table, per-card rate and goal bonus)
//! come from [`RewardConfig`] so they can be tuned per deployment.

mod table;

pub use table::{RewardStep, RewardTable};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reward configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub table: RewardTable,
    /// Xavicoins per studied card.
    pub per_card_rate: u32,
    /// Xavicoins added when the session goal was reached.
    pub time_bonus: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            table: RewardTable::default(),
            per_card_rate: 1,
            time_bonus: 5,
        }
    }
}

/// Reward earned by one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardBreakdown {
    pub base_reward: u32,
    pub cards_bonus: u32,
    pub time_bonus: u32,
    pub time_bonus_achieved: bool,
    pub xavicoins: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RewardCalculator {
    config: RewardConfig,
}

impl RewardCalculator {
    /// Create a calculator, validating the step table.
    pub fn new(config: RewardConfig) -> Result<Self, ValidationError> {
        config.table.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn compute(&self, elapsed_secs: u64, cards_studied: u32, goal_minutes: u32) -> RewardBreakdown {
        let base_reward = self.config.table.base_reward(elapsed_secs / 60);
        let cards_bonus = cards_studied.saturating_mul(self.config.per_card_rate);
        let time_bonus_achieved = elapsed_secs >= u64::from(goal_minutes) * 60;
        let time_bonus = if time_bonus_achieved {
            self.config.time_bonus
        } else {
            0
        };

        RewardBreakdown {
            base_reward,
            cards_bonus,
            time_bonus,
            time_bonus_achieved,
            xavicoins: base_reward
                .saturating_add(cards_bonus)
                .saturating_add(time_bonus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calc() -> RewardCalculator {
        RewardCalculator::new(RewardConfig::default()).unwrap()
    }

    #[test]
    fn goal_reached_with_no_cards() {
        let r = calc().compute(600, 0, 10);
        assert!(r.time_bonus_achieved);
        assert_eq!(r.cards_bonus, 0);
        assert_eq!(r.base_reward, 10);
        assert_eq!(r.xavicoins, 10 + 5);
    }

    #[test]
    fn below_goal_with_cards() {
        let r = calc().compute(300, 5, 10);
        assert!(!r.time_bonus_achieved);
        // 5 minutes is below the first step, so the minimum applies.
        assert_eq!(r.base_reward, 0);
        assert_eq!(r.xavicoins, 5);
    }

    #[test]
    fn picks_highest_threshold_not_above_elapsed() {
        let c = calc();
        assert_eq!(c.compute(29 * 60 + 59, 0, 90).base_reward, 20);
        assert_eq!(c.compute(30 * 60, 0, 90).base_reward, 30);
        assert_eq!(c.compute(5 * 3600, 0, 600).base_reward, 60);
    }

    #[test]
    fn custom_config_is_honoured() {
        let config = RewardConfig {
            table: RewardTable::new(
                vec![RewardStep::new(1, 3), RewardStep::new(5, 12)],
                1,
            ),
            per_card_rate: 2,
            time_bonus: 7,
        };
        let c = RewardCalculator::new(config).unwrap();
        let r = c.compute(30, 4, 1);
        assert_eq!(r.base_reward, 1);
        assert_eq!(r.cards_bonus, 8);
        assert!(!r.time_bonus_achieved);
        assert_eq!(r.xavicoins, 9);

        let r = c.compute(6 * 60, 0, 5);
        assert_eq!(r.xavicoins, 12 + 7);
    }

    #[test]
    fn rejects_unordered_table() {
        let config = RewardConfig {
            table: RewardTable::new(vec![RewardStep::new(15, 15), RewardStep::new(10, 10)], 0),
            ..RewardConfig::default()
        };
        assert!(RewardCalculator::new(config).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let r = calc().compute(600, 2, 10);
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["timeBonusAchieved"], true);
        assert_eq!(json["cardsBonus"], 2);
        assert_eq!(json["xavicoins"], 17);
    }

    proptest! {
        #[test]
        fn reward_is_monotonic_in_elapsed(a in 0u64..20_000, b in 0u64..20_000, cards in 0u32..200) {
            let c = calc();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(c.compute(lo, cards, 30).xavicoins <= c.compute(hi, cards, 30).xavicoins);
        }

        #[test]
        fn total_is_sum_of_parts(secs in 0u64..20_000, cards in 0u32..500, goal in 0u32..120) {
            let r = calc().compute(secs, cards, goal);
            prop_assert_eq!(r.xavicoins, r.base_reward + r.cards_bonus + r.time_bonus);
            prop_assert_eq!(r.time_bonus_achieved, secs >= u64::from(goal) * 60);
        }
    }
}
