use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "xavistudy-cli", version, about = "Xavistudy study session CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the Xavicoin reward for a session
    Reward(commands::reward::RewardArgs),
    /// Study session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Daily streak update
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Locally recorded sessions, most recent first
    History {
        /// Maximum number of sessions to print
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Local history statistics
    Stats,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("XAVISTUDY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Reward(args) => commands::reward::run(args),
        Commands::Session { action } => commands::session::run(action).await,
        Commands::Streak { action } => commands::streak::run(action).await,
        Commands::History { limit } => commands::history::history(limit),
        Commands::Stats => commands::history::stats(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
