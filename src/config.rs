//! Process configuration read from the environment
//!
//! `.env` is loaded first (if present) so local development does not need
//! exported variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::team::MembershipPolicy;

const DEV_JWT_SECRET: &str = "prompt-teams-dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub policy: MembershipPolicy,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load `.env` and read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let logging = LoggingSettings {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        };

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            jwt_secret,
            policy: MembershipPolicy {
                max_owned_teams: parse_or(
                    &lookup,
                    "MAX_OWNED_TEAMS",
                    MembershipPolicy::default().max_owned_teams,
                )?,
            },
            logging,
        })
    }

    /// True when no `JWT_SECRET` was configured
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse().ok();
            parsed.ok_or(ConfigError::Invalid { key, value })
        }
    }
}
