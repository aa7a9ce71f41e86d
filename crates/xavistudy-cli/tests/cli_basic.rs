//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with `HOME` pointed at a fresh temp dir,
//! so config and database files never touch the real profile.

use std::path::Path;
use std::process::Command;

use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_xavistudy-cli"))
        .args(args)
        .env("HOME", home)
        .env("XAVISTUDY_LOG", "off")
        .env_remove("XAVISTUDY_ENV")
        .env_remove("XAVISTUDY_TOKEN")
        .output()
        .expect("failed to execute CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

/// Point the CLI at a mock backend.
fn use_backend(home: &Path, server: &Server) {
    let url = format!("{}/api", server.url());
    let (_, stderr, code) = run_cli(home, &["config", "set", "api.base_url", &url]);
    assert_eq!(code, 0, "config set failed: {stderr}");
}

#[test]
fn reward_at_goal_includes_time_bonus() {
    let home = TempDir::new().unwrap();
    let json = run_json(
        home.path(),
        &["reward", "--minutes", "10", "--cards", "0", "--goal", "10"],
    );
    assert_eq!(json["baseReward"], 10);
    assert_eq!(json["timeBonusAchieved"], true);
    assert_eq!(json["xavicoins"], 15);
}

#[test]
fn reward_below_goal_pays_cards_only() {
    let home = TempDir::new().unwrap();
    let json = run_json(
        home.path(),
        &["reward", "--seconds", "300", "--cards", "5", "--goal", "10"],
    );
    assert_eq!(json["timeBonusAchieved"], false);
    assert_eq!(json["xavicoins"], 5);
}

#[test]
fn reward_requires_elapsed_time() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["reward", "--cards", "3"]);
    assert_ne!(code, 0);
}

#[test]
fn config_set_changes_reward() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "rewards.time_bonus", "8"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "rewards.time_bonus"]);
    assert_eq!(stdout.trim(), "8");

    let json = run_json(
        home.path(),
        &["reward", "--minutes", "10", "--goal", "10"],
    );
    assert_eq!(json["xavicoins"], 18);

    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "rewards.time_bonus"]);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn config_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "rewards.nope", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("rewards.nope"));

    let (_, _, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn config_show_prints_toml() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[api]"));
    assert!(stdout.contains("base_url"));
}

#[test]
fn history_and_stats_start_empty() {
    let home = TempDir::new().unwrap();
    let history = run_json(home.path(), &["history"]);
    assert_eq!(history, serde_json::json!([]));

    let stats = run_json(home.path(), &["stats"]);
    assert_eq!(stats["total_sessions"], 0);
    assert_eq!(stats["total_xavicoins"], 0);
}

#[test]
fn session_run_commits_and_records_history() {
    let home = TempDir::new().unwrap();
    let mut server = Server::new();
    let create = server
        .mock("POST", "/api/study-sessions")
        .match_body(Matcher::PartialJson(json!({
            "deckCategory": "math",
            "sessionGoalMinutes": 10
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 5}"#)
        .expect(1)
        .create();
    let finish = server
        .mock("PUT", "/api/study-sessions/5/finish")
        .match_body(Matcher::PartialJson(json!({
            "cardsStudied": 2,
            "duration": 1
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"statistics": {"totalSessions": 1, "totalStudySeconds": 1}}"#)
        .expect(1)
        .create();
    use_backend(home.path(), &server);

    let outcome = run_json(
        home.path(),
        &["session", "run", "--seconds", "1", "--cards", "2", "--goal", "10"],
    );
    assert_eq!(outcome["remote_id"], "5");
    assert_eq!(outcome["elapsed_seconds"], 1);
    assert_eq!(outcome["cards_studied"], 2);
    assert_eq!(outcome["reward"]["timeBonusAchieved"], false);
    create.assert();
    finish.assert();

    let history = run_json(home.path(), &["history"]);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["remote_id"], "5");
    assert_eq!(rows[0]["elapsed_secs"], 1);
    assert_eq!(rows[0]["cards_studied"], 2);

    let stats = run_json(home.path(), &["stats"]);
    assert_eq!(stats["total_sessions"], 1);
}

#[test]
fn session_run_requires_positive_seconds() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["session", "run", "--seconds", "0"]);
    assert_ne!(code, 0);

    let history = run_json(home.path(), &["history"]);
    assert_eq!(history, json!([]));
}

#[test]
fn session_run_reports_backend_failure() {
    let home = TempDir::new().unwrap();
    let mut server = Server::new();
    let create = server
        .mock("POST", "/api/study-sessions")
        .with_status(500)
        .with_body(r#"{"message": "db down"}"#)
        .create();
    use_backend(home.path(), &server);

    let (_, stderr, code) = run_cli(home.path(), &["session", "run", "--seconds", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("db down"), "stderr: {stderr}");
    create.assert();

    let history = run_json(home.path(), &["history"]);
    assert_eq!(history, json!([]));
}

#[test]
fn streak_update_runs_once_per_day() {
    let home = TempDir::new().unwrap();
    let mut server = Server::new();
    let streak = server
        .mock("POST", "/api/users/42/streak")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();
    let me = server
        .mock("GET", "/api/auth/me")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 42, "username": "ana", "currentStreak": 3}"#)
        .expect(1)
        .create();
    let progress = server
        .mock("POST", "/api/achievements/progress/streak")
        .match_body(Matcher::Json(json!({ "userId": "42", "streakDays": 3 })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();
    use_backend(home.path(), &server);

    let first = run_json(home.path(), &["streak", "update", "--user-id", "42"]);
    assert_eq!(first, json!({ "outcome": "updated", "streak": 3 }));

    let second = run_json(home.path(), &["streak", "update", "--user-id", "42"]);
    assert_eq!(second, json!({ "outcome": "already_updated_today" }));

    streak.assert();
    me.assert();
    progress.assert();
}
