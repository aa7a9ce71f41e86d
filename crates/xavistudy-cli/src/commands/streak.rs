use std::sync::Arc;

use clap::Subcommand;
use xavistudy_core::{
    Config, Database, HttpBackend, KvStreakMemo, StreakUpdateCoordinator, SystemClock, User,
    UserApi, UserId,
};

use super::CmdResult;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Update today's streak unless it already ran today
    Update {
        /// Use this user id instead of asking the backend who is signed in
        #[arg(long)]
        user_id: Option<String>,
    },
}

pub async fn run(action: StreakAction) -> CmdResult {
    match action {
        StreakAction::Update { user_id } => {
            let config = Config::load()?;
            let backend = Arc::new(HttpBackend::from_config(&config)?);
            let memo = KvStreakMemo::new(Database::open()?);
            let coordinator = StreakUpdateCoordinator::new(
                backend.clone(),
                backend.clone(),
                backend.clone(),
                Arc::new(SystemClock),
                Arc::new(memo),
            );

            let user = match user_id {
                Some(id) => User {
                    id: UserId(id),
                    username: String::new(),
                    current_streak: 0,
                    longest_streak: 0,
                    xavicoins: 0,
                },
                None => backend.current_user().await?,
            };
            coordinator.set_user(Some(user));

            let outcome = coordinator.maybe_update().await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }
    Ok(())
}
