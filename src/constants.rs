// ABOUTME: System-wide constants and environment-backed defaults for the TallyHub server
// ABOUTME: Contains ports, timeouts, channel capacities, bot backoff, and Twitch chat settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Constants Module
//!
//! Hardcoded defaults plus the environment variable names that override them.

/// Service identity for logs
pub mod service_names {
    /// Name reported in structured logs
    pub const TALLYHUB_SERVER: &str = "tallyhub-server";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8090;
}

/// Environment variable names
pub mod env_vars {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Store URL (`memory` or `sqlite:<path>`)
    pub const STORE_URL: &str = "STORE_URL";
    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECS: &str = "WEBHOOK_TIMEOUT_SECS";
    /// Webhook connect timeout
    pub const WEBHOOK_CONNECT_TIMEOUT_SECS: &str = "WEBHOOK_CONNECT_TIMEOUT_SECS";
    /// Maximum delivery attempts per notification
    pub const WEBHOOK_MAX_ATTEMPTS: &str = "WEBHOOK_MAX_ATTEMPTS";
    /// First retry delay
    pub const WEBHOOK_RETRY_BASE_MS: &str = "WEBHOOK_RETRY_BASE_MS";
    /// Twitch chat websocket endpoint
    pub const TWITCH_IRC_URL: &str = "TWITCH_IRC_URL";
    /// Chat connect timeout
    pub const BOT_CONNECT_TIMEOUT_SECS: &str = "BOT_CONNECT_TIMEOUT_SECS";
    /// First reconnect delay
    pub const BOT_BACKOFF_BASE_MS: &str = "BOT_BACKOFF_BASE_MS";
    /// Reconnect delay cap
    pub const BOT_BACKOFF_MAX_MS: &str = "BOT_BACKOFF_MAX_MS";
    /// Consecutive failures before the session moves to `Error`
    pub const BOT_MAX_FAILURES: &str = "BOT_MAX_FAILURES";
    /// Connection lifetime after which the failure count resets
    pub const BOT_STABLE_CONNECTION_MS: &str = "BOT_STABLE_CONNECTION_MS";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
}

/// Timeouts
pub mod timeouts {
    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;
    /// Webhook connect timeout
    pub const WEBHOOK_CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Chat handshake timeout
    pub const BOT_CONNECT_TIMEOUT_SECS: u64 = 15;
    /// Delay between websocket keepalive pings to overlays
    pub const OVERLAY_PING_INTERVAL_SECS: u64 = 30;
}

/// Webhook retry defaults
pub mod webhook_retry {
    /// Maximum attempts per notification, including the first
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Base delay before the first retry
    pub const BASE_DELAY_MS: u64 = 500;
    /// Retry delay cap
    pub const MAX_DELAY_MS: u64 = 8_000;
}

/// Bot reconnect defaults
pub mod bot_backoff {
    /// Base reconnect delay
    pub const BASE_DELAY_MS: u64 = 1_000;
    /// Reconnect delay cap
    pub const MAX_DELAY_MS: u64 = 60_000;
    /// Consecutive failed connects before giving up
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 8;
    /// Connections dropped sooner than this count as failed connects
    pub const STABLE_CONNECTION_MS: u64 = 30_000;
}

/// Channel capacities
pub mod channels {
    /// Buffered real-time events per overlay subscriber
    pub const SUBSCRIBER_BUFFER: usize = 64;
    /// Buffered outgoing chat lines per bot session
    pub const CHAT_OUTBOX_BUFFER: usize = 32;
    /// Buffered control messages per bot session
    pub const SESSION_CONTROL_BUFFER: usize = 8;
}

/// Twitch chat endpoints
pub mod twitch {
    /// Chat websocket endpoint
    pub const IRC_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";
    /// Capabilities requested after connecting
    pub const CAPABILITIES: &str = "twitch.tv/tags twitch.tv/commands";
    /// Public channel URL prefix
    pub const CHANNEL_URL_PREFIX: &str = "https://twitch.tv/";
}
