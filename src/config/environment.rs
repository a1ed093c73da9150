// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed store, HTTP client, and chat bot configs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! Environment-based configuration management

use crate::constants::{bot_backoff, env_vars, ports, timeouts, twitch, webhook_retry};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Counter store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StoreUrl {
    /// Process-local store, lost on restart
    #[default]
    Memory,
    /// SQLite database file
    Sqlite { path: PathBuf },
}

impl StoreUrl {
    /// Parse `memory`, `sqlite::memory:` or `sqlite:<path>`
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported schemes or an empty path
    pub fn parse_url(s: &str) -> Result<Self> {
        match s.trim() {
            "memory" | "sqlite::memory:" => Ok(Self::Memory),
            other => match other.strip_prefix("sqlite:") {
                Some(path) if !path.is_empty() => Ok(Self::Sqlite {
                    path: PathBuf::from(path),
                }),
                _ => bail!("unsupported STORE_URL '{other}' (expected 'memory' or 'sqlite:<path>')"),
            },
        }
    }
}

/// Outbound webhook client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Per-request timeout in seconds
    pub webhook_timeout_secs: u64,
    /// Connect timeout in seconds
    pub webhook_connect_timeout_secs: u64,
    /// Maximum delivery attempts per notification, including the first
    pub max_attempts: u32,
    /// Base delay for exponential retry backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// Maximum delay cap for retries in milliseconds
    pub retry_max_delay_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: timeouts::WEBHOOK_TIMEOUT_SECS,
            webhook_connect_timeout_secs: timeouts::WEBHOOK_CONNECT_TIMEOUT_SECS,
            max_attempts: webhook_retry::MAX_ATTEMPTS,
            retry_base_delay_ms: webhook_retry::BASE_DELAY_MS,
            retry_max_delay_ms: webhook_retry::MAX_DELAY_MS,
        }
    }
}

/// Chat bot session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Chat websocket endpoint
    pub irc_url: String,
    /// Handshake timeout in seconds
    pub connect_timeout_secs: u64,
    /// Base reconnect delay in milliseconds
    pub backoff_base_ms: u64,
    /// Reconnect delay cap in milliseconds
    pub backoff_max_ms: u64,
    /// Consecutive failures before the session enters `Error`
    pub max_consecutive_failures: u32,
    /// Minimum connection lifetime that resets the failure count
    pub stable_connection_ms: u64,
}

impl BotConfig {
    /// Handshake timeout
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Minimum lifetime of a connection that counts as recovered
    #[must_use]
    pub const fn stable_connection(&self) -> Duration {
        Duration::from_millis(self.stable_connection_ms)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            irc_url: twitch::IRC_WS_URL.to_owned(),
            connect_timeout_secs: timeouts::BOT_CONNECT_TIMEOUT_SECS,
            backoff_base_ms: bot_backoff::BASE_DELAY_MS,
            backoff_max_ms: bot_backoff::MAX_DELAY_MS,
            max_consecutive_failures: bot_backoff::MAX_CONSECUTIVE_FAILURES,
            stable_connection_ms: bot_backoff::STABLE_CONNECTION_MS,
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Counter store backend
    pub store_url: StoreUrl,
    /// Outbound webhook client
    pub http_client: HttpClientConfig,
    /// Chat bot sessions
    pub bot: BotConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            environment: Environment::default(),
            store_url: StoreUrl::default(),
            http_client: HttpClientConfig::default(),
            bot: BotConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: env_parse(env_vars::HTTP_PORT, ports::DEFAULT_HTTP_PORT)?,
            environment: Environment::from_str_or_default(&env_var_or(
                env_vars::ENVIRONMENT,
                "development",
            )),
            store_url: StoreUrl::parse_url(&env_var_or(env_vars::STORE_URL, "memory"))?,
            http_client: HttpClientConfig {
                webhook_timeout_secs: env_parse(
                    env_vars::WEBHOOK_TIMEOUT_SECS,
                    timeouts::WEBHOOK_TIMEOUT_SECS,
                )?,
                webhook_connect_timeout_secs: env_parse(
                    env_vars::WEBHOOK_CONNECT_TIMEOUT_SECS,
                    timeouts::WEBHOOK_CONNECT_TIMEOUT_SECS,
                )?,
                max_attempts: env_parse(env_vars::WEBHOOK_MAX_ATTEMPTS, webhook_retry::MAX_ATTEMPTS)?,
                retry_base_delay_ms: env_parse(
                    env_vars::WEBHOOK_RETRY_BASE_MS,
                    webhook_retry::BASE_DELAY_MS,
                )?,
                retry_max_delay_ms: webhook_retry::MAX_DELAY_MS,
            },
            bot: BotConfig {
                irc_url: env_var_or(env_vars::TWITCH_IRC_URL, twitch::IRC_WS_URL),
                connect_timeout_secs: env_parse(
                    env_vars::BOT_CONNECT_TIMEOUT_SECS,
                    timeouts::BOT_CONNECT_TIMEOUT_SECS,
                )?,
                backoff_base_ms: env_parse(env_vars::BOT_BACKOFF_BASE_MS, bot_backoff::BASE_DELAY_MS)?,
                backoff_max_ms: env_parse(env_vars::BOT_BACKOFF_MAX_MS, bot_backoff::MAX_DELAY_MS)?,
                max_consecutive_failures: env_parse(
                    env_vars::BOT_MAX_FAILURES,
                    bot_backoff::MAX_CONSECUTIVE_FAILURES,
                )?,
                stable_connection_ms: env_parse(
                    env_vars::BOT_STABLE_CONNECTION_MS,
                    bot_backoff::STABLE_CONNECTION_MS,
                )?,
            },
        };

        config.validate()?;
        info!(
            http_port = config.http_port,
            environment = %config.environment,
            store = ?config.store_url,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error when a value would disable a bounded guarantee
    pub fn validate(&self) -> Result<()> {
        if self.http_client.webhook_timeout_secs == 0 {
            bail!("{} must be greater than zero", env_vars::WEBHOOK_TIMEOUT_SECS);
        }
        if self.http_client.max_attempts == 0 {
            bail!("{} must be at least 1", env_vars::WEBHOOK_MAX_ATTEMPTS);
        }
        if self.bot.connect_timeout_secs == 0 {
            bail!("{} must be greater than zero", env_vars::BOT_CONNECT_TIMEOUT_SECS);
        }
        if self.bot.max_consecutive_failures == 0 {
            bail!("{} must be at least 1", env_vars::BOT_MAX_FAILURES);
        }
        if self.bot.backoff_base_ms > self.bot.backoff_max_ms {
            bail!(
                "{} must not exceed {}",
                env_vars::BOT_BACKOFF_BASE_MS,
                env_vars::BOT_BACKOFF_MAX_MS
            );
        }
        Ok(())
    }
}

/// Get environment variable or default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, using `default` when it is unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value '{raw}'")),
        Err(_) => Ok(default),
    }
}
