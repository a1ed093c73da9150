// ABOUTME: Chat command parsing against a tenant's counters and the mutation permission gate
// ABOUTME: Recognizes queries, increments, decrements, and resets; everything else is ignored
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::transport::ChatRoles;
use tallyhub_core::constants::chat;
use tallyhub_core::models::{BotSettings, CounterDefinition};

/// Mutation requested from chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// `!<counter>+`
    Increment,
    /// `!<counter>-`
    Decrement,
    /// `!reset<counter>`
    Reset,
}

/// A recognized chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!<counter>`: report one counter
    Query {
        /// Counter key
        counter: String,
    },
    /// `!counters` or `!stats`: report every counter
    QueryAll,
    /// Change a counter
    Mutate {
        /// Counter key
        counter: String,
        /// Requested change
        action: CommandAction,
    },
}

impl ChatCommand {
    /// Whether the command changes state
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::Mutate { .. })
    }
}

fn resolve<'a>(name: &str, counters: &'a [CounterDefinition]) -> Option<&'a CounterDefinition> {
    if name.is_empty() {
        return None;
    }
    counters
        .iter()
        .find(|c| c.key == name)
        .or_else(|| counters.iter().find(|c| c.stem() == name))
        .or_else(|| counters.iter().find(|c| c.alias.as_deref() == Some(name)))
}

/// Parse a chat message into a command
///
/// Only the first token is considered and matching is case-insensitive. Counters match
/// by key (`deaths`), singular stem (`death`), or custom alias.
#[must_use]
pub fn parse(text: &str, counters: &[CounterDefinition]) -> Option<ChatCommand> {
    let token = text
        .trim_start()
        .strip_prefix(chat::COMMAND_PREFIX)?
        .split_whitespace()
        .next()?
        .to_lowercase();

    if token == "counters" || token == "stats" {
        return Some(ChatCommand::QueryAll);
    }
    if let Some(name) = token.strip_suffix('+') {
        return resolve(name, counters).map(|c| ChatCommand::Mutate {
            counter: c.key.clone(),
            action: CommandAction::Increment,
        });
    }
    if let Some(name) = token.strip_suffix('-') {
        return resolve(name, counters).map(|c| ChatCommand::Mutate {
            counter: c.key.clone(),
            action: CommandAction::Decrement,
        });
    }
    if let Some(counter) = resolve(&token, counters) {
        return Some(ChatCommand::Query {
            counter: counter.key.clone(),
        });
    }
    token
        .strip_prefix("reset")
        .and_then(|name| resolve(name, counters))
        .map(|c| ChatCommand::Mutate {
            counter: c.key.clone(),
            action: CommandAction::Reset,
        })
}

/// Whether a sender may run a command
///
/// Queries are open to everyone. Mutations need the broadcaster or a moderator, or a
/// VIP when the tenant allows VIPs.
#[must_use]
pub const fn is_authorized(command: &ChatCommand, roles: &ChatRoles, settings: &BotSettings) -> bool {
    if !command.is_mutating() {
        return true;
    }
    roles.broadcaster || roles.moderator || (roles.vip && settings.allow_vips)
}
