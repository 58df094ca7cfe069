// src/config.rs

use std::env;
use std::time::Duration;
use dotenvy::dotenv;

/// Allowed number of questions per attempt.
pub const MIN_QUESTION_COUNT: usize = 3;
pub const MAX_QUESTION_COUNT: usize = 50;
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Allowed attempt time limit, in minutes.
pub const MIN_TIME_LIMIT_MINUTES: u64 = 5;
pub const MAX_TIME_LIMIT_MINUTES: u64 = 120;
pub const DEFAULT_TIME_LIMIT_MINUTES: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    /// Username of an admin account to create at startup, if missing.
    pub admin_username: Option<String>,
    /// How often an open attempt's deadline is checked.
    pub auto_submit_tick: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://mocktest.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok().filter(|u| !u.trim().is_empty());

        let tick_ms = env::var("AUTO_SUBMIT_TICK_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(1000);

        Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            admin_username,
            auto_submit_tick: Duration::from_millis(tick_ms),
        }
    }
}
