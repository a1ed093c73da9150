// ABOUTME: Twitch chat transport speaking IRC over a websocket via tokio-tungstenite
// ABOUTME: Handles the CAP/PASS/NICK/JOIN handshake, PING keepalive, and PRIVMSG parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::irc::IrcLine;
use super::transport::{BotCredentials, ChatConnection, ChatError, ChatMessage, ChatTransport};
use crate::constants::twitch;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use tallyhub_core::constants::chat;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

type IrcSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const AUTH_FAILURE_NOTICES: &[&str] = &["Login authentication failed", "Improperly formatted auth"];

/// Twitch IRC-over-websocket transport
#[derive(Debug, Clone)]
pub struct TwitchTransport {
    url: String,
}

impl Default for TwitchTransport {
    fn default() -> Self {
        Self::new(twitch::IRC_WS_URL)
    }
}

impl TwitchTransport {
    /// Transport connecting to `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ChatTransport for TwitchTransport {
    async fn connect(&self, credentials: &BotCredentials) -> Result<Box<dyn ChatConnection>, ChatError> {
        let (socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        let mut connection = TwitchConnection {
            socket,
            channel: credentials.channel.trim_start_matches('#').to_ascii_lowercase(),
            pending: VecDeque::new(),
        };

        let token = credentials.oauth_token.trim_start_matches("oauth:");
        connection
            .send_raw(&format!("CAP REQ :{}", twitch::CAPABILITIES))
            .await?;
        connection.send_raw(&format!("PASS oauth:{token}")).await?;
        connection
            .send_raw(&format!("NICK {}", credentials.login.to_ascii_lowercase()))
            .await?;
        connection.await_welcome().await?;
        connection
            .send_raw(&format!("JOIN #{}", connection.channel))
            .await?;
        debug!(channel = %connection.channel, "Joined Twitch chat");
        Ok(Box::new(connection))
    }
}

struct TwitchConnection {
    socket: IrcSocket,
    channel: String,
    pending: VecDeque<ChatMessage>,
}

impl TwitchConnection {
    async fn send_raw(&mut self, line: &str) -> Result<(), ChatError> {
        self.socket
            .send(Message::Text(line.to_owned()))
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))
    }

    /// Read until `001`, answering pings and failing on an authentication notice
    async fn await_welcome(&mut self) -> Result<(), ChatError> {
        loop {
            let Some(text) = self.read_text().await? else {
                return Err(ChatError::Closed("closed during handshake".into()));
            };
            for line in text.split("\r\n").filter_map(IrcLine::parse) {
                match line.command.as_str() {
                    "001" => return Ok(()),
                    "PING" => self.pong(&line).await?,
                    "NOTICE" => {
                        let notice = line.trailing.unwrap_or_default();
                        if AUTH_FAILURE_NOTICES.iter().any(|n| notice.contains(n)) {
                            return Err(ChatError::AuthenticationFailed(notice));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    async fn read_text(&mut self) -> Result<Option<String>, ChatError> {
        loop {
            match self.socket.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(ChatError::Transport(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(frame))) => {
                    return Err(ChatError::Closed(
                        frame.map_or_else(String::new, |f| f.reason.into_owned()),
                    ))
                }
                Some(Ok(_)) => {}
            }
        }
    }

    async fn pong(&mut self, ping: &IrcLine) -> Result<(), ChatError> {
        let server = ping.trailing.as_deref().unwrap_or("tmi.twitch.tv");
        self.send_raw(&format!("PONG :{server}")).await
    }
}

#[async_trait]
impl ChatConnection for TwitchConnection {
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }
            let Some(text) = self.read_text().await? else {
                return Ok(None);
            };
            for line in text.split("\r\n").filter_map(IrcLine::parse) {
                trace!(command = %line.command, "IRC line");
                match line.command.as_str() {
                    "PING" => self.pong(&line).await?,
                    "RECONNECT" => return Err(ChatError::Closed("server requested reconnect".into())),
                    "PRIVMSG" => {
                        if let Some(message) = line.to_chat_message() {
                            self.pending.push_back(message);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ChatError> {
        let mut text = text.replace(['\r', '\n'], " ");
        if text.len() > chat::MAX_MESSAGE_LEN {
            let mut cut = chat::MAX_MESSAGE_LEN;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        let line = format!("PRIVMSG #{} :{text}", self.channel);
        self.send_raw(&line).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "Error closing Twitch chat socket");
        }
    }
}
