use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use xavistudy_core::{
    Config, Database, Event, HttpBackend, RewardCalculator, SessionConfig, StudyController, Ticker,
};

use super::CmdResult;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a complete session against the configured backend and record it
    Run {
        /// Deck category
        #[arg(long, default_value = "math")]
        category: String,
        /// Math topic within the deck
        #[arg(long)]
        topic: Option<String>,
        /// Session goal in minutes (defaults to session.default_goal_minutes)
        #[arg(long)]
        goal: Option<u32>,
        /// Cards to mark as studied
        #[arg(long, default_value = "0")]
        cards: u32,
        /// Foreground study seconds to accumulate before finishing
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        seconds: u64,
        /// Notes sent with the finish request
        #[arg(long)]
        notes: Option<String>,
    },
}

pub async fn run(action: SessionAction) -> CmdResult {
    match action {
        SessionAction::Run {
            category,
            topic,
            goal,
            cards,
            seconds,
            notes,
        } => {
            let config = Config::load()?;
            let controller = StudyController::new(
                Arc::new(HttpBackend::from_config(&config)?),
                RewardCalculator::new(config.reward_config())?,
                Ticker::new(),
            );
            let session = SessionConfig {
                deck_category: category,
                deck_math_topic: topic,
                goal_minutes: goal.unwrap_or(config.session.default_goal_minutes),
            };
            run_session(&controller, session, cards, seconds, notes).await
        }
    }
}

async fn run_session(
    controller: &StudyController,
    session: SessionConfig,
    cards: u32,
    seconds: u64,
    notes: Option<String>,
) -> CmdResult {
    let mut events = controller.subscribe();
    let started = controller.start(session).await?;
    info!(remote_id = ?started.remote_id, target_secs = seconds, "session running");

    for _ in 0..cards {
        controller.record_card_studied()?;
    }

    // Pausing from the tick that reaches the target keeps the count exact
    // and leaves a failed finish paused instead of ticking on.
    loop {
        match events.recv().await {
            Ok(Event::Tick { elapsed_secs, .. }) => {
                debug!(elapsed_secs, "tick");
                if elapsed_secs >= seconds {
                    controller.pause()?;
                    break;
                }
            }
            Err(RecvError::Lagged(_)) if controller.elapsed_secs() >= seconds => {
                controller.pause()?;
                break;
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return Err("session event stream closed".into()),
        }
    }

    let outcome = controller.finish(notes).await?;
    let finished = controller.dismiss()?;
    let db = Database::open()?;
    db.record_session(&finished, Utc::now())?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
