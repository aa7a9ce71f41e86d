mod config;
pub mod database;

pub use config::{ApiConfig, Config, RewardsConfig, SessionDefaults};
pub use database::{Database, SessionRecord, Stats};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/xavistudy[-dev]/` based on XAVISTUDY_ENV.
///
/// Set XAVISTUDY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("XAVISTUDY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("xavistudy-dev")
    } else {
        base_dir.join("xavistudy")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
