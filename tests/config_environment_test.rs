// ABOUTME: Unit tests for environment-driven server configuration
// ABOUTME: Validates defaults, overrides, parse errors, and cross-field validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tallyhub_server::config::{Environment, ServerConfig, StoreUrl};
use tallyhub_server::constants::env_vars;

const ALL_VARS: &[&str] = &[
    env_vars::HTTP_PORT,
    env_vars::STORE_URL,
    env_vars::WEBHOOK_TIMEOUT_SECS,
    env_vars::WEBHOOK_CONNECT_TIMEOUT_SECS,
    env_vars::WEBHOOK_MAX_ATTEMPTS,
    env_vars::WEBHOOK_RETRY_BASE_MS,
    env_vars::TWITCH_IRC_URL,
    env_vars::BOT_CONNECT_TIMEOUT_SECS,
    env_vars::BOT_BACKOFF_BASE_MS,
    env_vars::BOT_BACKOFF_MAX_MS,
    env_vars::BOT_MAX_FAILURES,
    env_vars::BOT_STABLE_CONNECTION_MS,
    env_vars::ENVIRONMENT,
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_environment_parsing() {
    assert_eq!(
        Environment::from_str_or_default("PROD"),
        Environment::Production
    );
    assert_eq!(
        Environment::from_str_or_default("test"),
        Environment::Testing
    );
    assert_eq!(
        Environment::from_str_or_default("anything"),
        Environment::Development
    ); // Default fallback
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 8090);
    assert_eq!(config.store_url, StoreUrl::Memory);
    assert_eq!(config.http_client.max_attempts, 3);
    assert_eq!(config.bot.irc_url, "wss://irc-ws.chat.twitch.tv:443");
    assert_eq!(config.bot.max_consecutive_failures, 8);
    assert_eq!(config.bot.stable_connection_ms, 30_000);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var(env_vars::HTTP_PORT, "9100");
    env::set_var(env_vars::STORE_URL, "sqlite:./data/tally.db");
    env::set_var(env_vars::WEBHOOK_MAX_ATTEMPTS, "5");
    env::set_var(env_vars::BOT_MAX_FAILURES, "2");
    env::set_var(env_vars::BOT_STABLE_CONNECTION_MS, "1500");
    env::set_var(env_vars::ENVIRONMENT, "production");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 9100);
    assert_eq!(
        config.store_url,
        StoreUrl::Sqlite {
            path: PathBuf::from("./data/tally.db")
        }
    );
    assert_eq!(config.http_client.max_attempts, 5);
    assert_eq!(config.bot.max_consecutive_failures, 2);
    assert_eq!(config.bot.stable_connection_ms, 1500);
    assert_eq!(config.environment, Environment::Production);
    clear_env();
}

#[test]
#[serial]
fn test_unparseable_value_is_an_error() {
    clear_env();
    env::set_var(env_vars::HTTP_PORT, "eighty");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains(env_vars::HTTP_PORT));
    clear_env();
}

#[test]
#[serial]
fn test_validation_rejects_disabled_bounds() {
    clear_env();
    env::set_var(env_vars::WEBHOOK_MAX_ATTEMPTS, "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var(env_vars::BOT_BACKOFF_BASE_MS, "5000");
    env::set_var(env_vars::BOT_BACKOFF_MAX_MS, "100");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}
