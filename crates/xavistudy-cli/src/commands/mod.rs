pub mod config;
pub mod history;
pub mod reward;
pub mod session;
pub mod streak;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;
