use clap::Args;
use xavistudy_core::{Config, RewardCalculator};

use super::CmdResult;

#[derive(Args)]
pub struct RewardArgs {
    /// Elapsed study time in minutes
    #[arg(long, conflicts_with = "seconds", required_unless_present = "seconds")]
    minutes: Option<u64>,
    /// Elapsed study time in seconds
    #[arg(long)]
    seconds: Option<u64>,
    /// Cards studied
    #[arg(long, default_value = "0")]
    cards: u32,
    /// Session goal in minutes (defaults to session.default_goal_minutes)
    #[arg(long)]
    goal: Option<u32>,
}

pub fn run(args: RewardArgs) -> CmdResult {
    let config = Config::load()?;
    let calculator = RewardCalculator::new(config.reward_config())?;

    let elapsed_secs = match (args.minutes, args.seconds) {
        (Some(minutes), _) => minutes.saturating_mul(60),
        (None, Some(seconds)) => seconds,
        (None, None) => 0,
    };
    let goal = args.goal.unwrap_or(config.session.default_goal_minutes);

    let breakdown = calculator.compute(elapsed_secs, args.cards, goal);
    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}
