use std::env;

use crate::constants::{NEW_THREAD_COOLDOWN_MS, REPLY_COOLDOWN_MS};
use crate::cooldown::CooldownPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: String,
    pub policy: CooldownPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./postform.db?mode=rwc".to_string()),
            policy: CooldownPolicy {
                new_thread_ms: env::var("NEW_THREAD_COOLDOWN_MS")
                    .unwrap_or_else(|_| NEW_THREAD_COOLDOWN_MS.to_string())
                    .parse()?,
                reply_ms: env::var("REPLY_COOLDOWN_MS")
                    .unwrap_or_else(|_| REPLY_COOLDOWN_MS.to_string())
                    .parse()?,
            },
        })
    }
}
