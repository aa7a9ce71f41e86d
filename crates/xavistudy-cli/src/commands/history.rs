use chrono::Utc;
use xavistudy_core::Database;

use super::CmdResult;

pub fn history(limit: usize) -> CmdResult {
    let db = Database::open()?;
    let sessions = db.recent_sessions(limit)?;
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}

pub fn stats() -> CmdResult {
    let db = Database::open()?;
    let stats = db.stats(Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
