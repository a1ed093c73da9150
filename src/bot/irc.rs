// ABOUTME: IRC line parser for Twitch chat including IRCv3 message tags
// ABOUTME: Extracts PRIVMSG text, sender, and badge-derived roles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::transport::{ChatMessage, ChatRoles};
use std::collections::HashMap;

/// One parsed IRC line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcLine {
    /// IRCv3 tags with unescaped values
    pub tags: HashMap<String, String>,
    /// Message source (`nick!user@host` or a server name)
    pub prefix: Option<String>,
    /// Command or numeric reply
    pub command: String,
    /// Middle parameters
    pub params: Vec<String>,
    /// Trailing parameter (after ` :`)
    pub trailing: Option<String>,
}

impl IrcLine {
    /// Parse one line without its CRLF terminator
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut parsed = Self::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (tags, remainder) = tagged.split_once(' ')?;
            parsed.tags = tags
                .split(';')
                .filter(|tag| !tag.is_empty())
                .map(|tag| match tag.split_once('=') {
                    Some((key, value)) => (key.to_owned(), unescape_tag(value)),
                    None => (tag.to_owned(), String::new()),
                })
                .collect();
            rest = remainder.trim_start();
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, remainder) = prefixed.split_once(' ')?;
            parsed.prefix = Some(prefix.to_owned());
            rest = remainder.trim_start();
        }

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing.to_owned())),
            None => (rest, None),
        };
        let mut words = head.split_whitespace();
        parsed.command = words.next()?.to_ascii_uppercase();
        parsed.params = words.map(str::to_owned).collect();
        parsed.trailing = trailing;
        Some(parsed)
    }

    /// Nickname part of the prefix
    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Sender roles from the `badges` and `mod` tags
    #[must_use]
    pub fn roles(&self) -> ChatRoles {
        let mut roles = ChatRoles::default();
        if let Some(badges) = self.tags.get("badges") {
            for badge in badges.split(',') {
                match badge.split_once('/').map_or(badge, |(name, _)| name) {
                    "broadcaster" => roles.broadcaster = true,
                    "moderator" => roles.moderator = true,
                    "vip" => roles.vip = true,
                    "subscriber" | "founder" => roles.subscriber = true,
                    _ => {}
                }
            }
        }
        if self.tags.get("mod").is_some_and(|value| value == "1") {
            roles.moderator = true;
        }
        roles
    }

    /// Chat message view of a PRIVMSG line
    #[must_use]
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        if self.command != "PRIVMSG" {
            return None;
        }
        let channel = self.params.first()?.trim_start_matches('#').to_owned();
        let sender = self
            .tags
            .get("display-name")
            .filter(|name| !name.is_empty())
            .map(String::as_str)
            .or_else(|| self.nick())?
            .to_owned();
        Some(ChatMessage {
            channel,
            sender,
            text: self.trailing.clone().unwrap_or_default(),
            roles: self.roles(),
        })
    }
}

fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_privmsg() {
        let line = "@badges=moderator/1,subscriber/12;display-name=Mod\\sGuy;mod=1 :modguy!modguy@modguy.tmi.twitch.tv PRIVMSG #streamer :!death+\r\n";
        let parsed = IrcLine::parse(line).unwrap();
        assert_eq!(parsed.command, "PRIVMSG");
        assert_eq!(parsed.nick(), Some("modguy"));
        let message = parsed.to_chat_message().unwrap();
        assert_eq!(message.channel, "streamer");
        assert_eq!(message.sender, "Mod Guy");
        assert_eq!(message.text, "!death+");
        assert!(message.roles.moderator);
        assert!(message.roles.subscriber);
        assert!(!message.roles.broadcaster);
    }

    #[test]
    fn test_parse_ping_and_welcome() {
        let ping = IrcLine::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(ping.command, "PING");
        assert_eq!(ping.trailing.as_deref(), Some("tmi.twitch.tv"));

        let welcome = IrcLine::parse(":tmi.twitch.tv 001 tallybot :Welcome, GLHF!").unwrap();
        assert_eq!(welcome.command, "001");
        assert_eq!(welcome.params, vec!["tallybot"]);
    }

    #[test]
    fn test_auth_failure_notice() {
        let notice = IrcLine::parse(":tmi.twitch.tv NOTICE * :Login authentication failed").unwrap();
        assert_eq!(notice.command, "NOTICE");
        assert_eq!(notice.trailing.as_deref(), Some("Login authentication failed"));
        assert!(notice.to_chat_message().is_none());
    }

    #[test]
    fn test_broadcaster_badge() {
        let line = "@badges=broadcaster/1 :owner!owner@owner.tmi.twitch.tv PRIVMSG #owner :!resetdeaths";
        let roles = IrcLine::parse(line).unwrap().roles();
        assert!(roles.broadcaster);
        assert!(!roles.vip);
    }
}
