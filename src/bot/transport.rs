// ABOUTME: Chat transport abstraction: connecting, receiving chat messages, and sending replies
// ABOUTME: Defines credentials, sender roles, and transport errors shared by all transports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Credentials a session uses to join its tenant's chat
///
/// Token acquisition and refresh belong to the OAuth layer; sessions only consume them.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotCredentials {
    /// Bot account login
    pub login: String,
    /// OAuth access token, with or without the `oauth:` prefix
    pub oauth_token: String,
    /// Channel to join, without `#`
    pub channel: String,
}

impl fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCredentials")
            .field("login", &self.login)
            .field("oauth_token", &"***")
            .field("channel", &self.channel)
            .finish()
    }
}

/// Privileges of a chat message sender
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoles {
    /// Channel owner
    pub broadcaster: bool,
    /// Channel moderator
    pub moderator: bool,
    /// Channel VIP
    pub vip: bool,
    /// Subscriber
    pub subscriber: bool,
}

/// One chat message received by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Channel the message was sent in, without `#`
    pub channel: String,
    /// Sender login
    pub sender: String,
    /// Message text
    pub text: String,
    /// Sender privileges
    pub roles: ChatRoles,
}

/// Chat transport failures
#[derive(Debug, Error)]
pub enum ChatError {
    /// The chat service rejected the credentials; retrying will not help
    #[error("chat authentication failed: {0}")]
    AuthenticationFailed(String),
    /// The connection was closed by the remote side
    #[error("chat connection closed: {0}")]
    Closed(String),
    /// Network or protocol failure
    #[error("chat transport error: {0}")]
    Transport(String),
}

impl ChatError {
    /// Whether reconnecting could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::AuthenticationFailed(_))
    }
}

/// Factory for chat connections
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Connect and complete the handshake, joining the credentials' channel
    async fn connect(&self, credentials: &BotCredentials) -> Result<Box<dyn ChatConnection>, ChatError>;
}

/// An established chat connection, owned by exactly one session task
#[async_trait]
pub trait ChatConnection: Send {
    /// Next chat message; `Ok(None)` when the connection ended cleanly
    ///
    /// Must be cancel-safe: dropping the future must not lose received messages.
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError>;

    /// Send a message to the joined channel
    async fn send(&mut self, text: &str) -> Result<(), ChatError>;

    /// Close the connection
    async fn close(&mut self);
}
