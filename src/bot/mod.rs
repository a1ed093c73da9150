// ABOUTME: Per-tenant chat bot sessions: supervision, command handling, and the chat transport
// ABOUTME: Each session task exclusively owns its chat connection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Bot Session Manager
//!
//! A tenant's chat bot is one supervised task moving through
//! `Disabled -> Connecting -> Connected -> Backoff -> Connecting ...`. The task is the
//! only owner of the chat connection; other components reach chat through the
//! [`ChatOutbox`], a bounded per-tenant queue drained by the session while it is
//! connected. Incoming chat commands are handed to a [`CommandHandler`], which in the
//! server is the counter service.

/// Chat command parsing and permission gates
pub mod commands;
/// IRC line and tag parsing
pub mod irc;
/// Supervising map of sessions
pub mod manager;
/// Per-tenant outbound chat queues
pub mod outbox;
/// Session task and state machine
pub mod session;
/// Chat transport abstraction
pub mod transport;
/// Twitch IRC-over-websocket transport
pub mod twitch;

pub use commands::{ChatCommand, CommandAction};
pub use manager::BotSessionManager;
pub use outbox::ChatOutbox;
pub use session::{BotState, CommandHandler};
pub use transport::{BotCredentials, ChatConnection, ChatError, ChatMessage, ChatRoles, ChatTransport};
pub use twitch::TwitchTransport;
