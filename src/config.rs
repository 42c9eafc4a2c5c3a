//! Process configuration, read from the environment (and `.env` when present).

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::services::token_service::{
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, RefreshPolicy, TokenLifetimes,
};

/// One year.
const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub secret_key: String,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub token_lifetimes: TokenLifetimes,
    pub refresh_policy: RefreshPolicy,
    pub bcrypt_cost: u32,
}

// Keeps the signing key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("token_lifetimes", &self.token_lifetimes)
            .field("refresh_policy", &self.refresh_policy)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:users.db?mode=rwc".to_string());

        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;
        let timeout_ms: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_MS", 5000)?;
        let access_secs: i64 = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", ACCESS_TOKEN_TTL_SECS)?;
        let refresh_secs: i64 =
            parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", REFRESH_TOKEN_TTL_SECS)?;
        let accepts_access: bool = parse_or(&lookup, "REFRESH_ACCEPTS_ACCESS_TOKENS", false)?;
        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        let access = ttl("ACCESS_TOKEN_TTL_SECS", access_secs)?;
        let refresh = ttl("REFRESH_TOKEN_TTL_SECS", refresh_secs)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", bcrypt_cost));
        }

        Ok(Self {
            secret_key,
            database_url,
            bind_addr,
            request_timeout: Duration::from_millis(timeout_ms),
            token_lifetimes: TokenLifetimes { access, refresh },
            refresh_policy: if accepts_access {
                RefreshPolicy::AnyValidToken
            } else {
                RefreshPolicy::RefreshTokenOnly
            },
            bcrypt_cost,
        })
    }
}

/// Token lifetimes must be positive and at most `MAX_TOKEN_TTL_SECS`.
fn ttl(name: &'static str, secs: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(invalid(name, secs));
    }
    chrono::Duration::try_seconds(secs).ok_or_else(|| invalid(name, secs))
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}
