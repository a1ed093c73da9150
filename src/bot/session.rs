// ABOUTME: Bot session task implementing the per-tenant connection state machine
// ABOUTME: Connects with a timeout, backs off with jitter, and gives up after repeated failed or short-lived connects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::outbox::ChatOutbox;
use super::transport::{BotCredentials, ChatConnection, ChatError, ChatMessage, ChatTransport};
use crate::config::BotConfig;
use crate::constants::channels;
use crate::logging::TenantLogger;
use crate::utils::backoff::Backoff;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tallyhub_core::models::TenantId;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Lifecycle state of a tenant's chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    /// No session
    Disabled,
    /// Handshake in progress
    Connecting,
    /// Joined and processing chat
    Connected,
    /// Waiting before the next connect
    Backoff,
    /// Gave up; stays here until re-enabled
    Error,
}

impl BotState {
    /// Whether a session task is working in this state
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Backoff)
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Backoff => "backoff",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Handles chat messages received by a session
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Process one chat message, returning a reply to post, if any
    async fn handle_chat(&self, tenant: &TenantId, message: &ChatMessage) -> Option<String>;
}

/// Control messages for a session task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    /// Close the connection and stop
    Disable,
}

/// Everything a session task needs
#[derive(Clone)]
pub struct SessionContext {
    /// Owning tenant
    pub tenant: TenantId,
    /// Chat credentials
    pub credentials: BotCredentials,
    /// Connection factory
    pub transport: Arc<dyn ChatTransport>,
    /// Chat message handler
    pub handler: Arc<dyn CommandHandler>,
    /// Outbound queue registry
    pub outbox: Arc<ChatOutbox>,
    /// Timeouts and backoff
    pub config: BotConfig,
}

/// Manager-side handle of a running session
pub struct SessionHandle {
    control: mpsc::Sender<SessionControl>,
    state: watch::Receiver<BotState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Current state
    #[must_use]
    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }

    /// State watch for observers
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BotState> {
        self.state.clone()
    }

    /// Whether the task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the session to stop and wait for it, aborting after `grace`
    pub async fn stop(self, grace: std::time::Duration) {
        if self.control.try_send(SessionControl::Disable).is_err() {
            debug!("Session control channel unavailable, aborting task");
            self.task.abort();
            return;
        }
        let abort = self.task.abort_handle();
        if timeout(grace, self.task).await.is_err() {
            abort.abort();
        }
    }
}

/// Start a session task
#[must_use]
pub fn spawn_session(context: SessionContext) -> SessionHandle {
    let (control, control_rx) = mpsc::channel(channels::SESSION_CONTROL_BUFFER);
    let (state_tx, state) = watch::channel(BotState::Connecting);
    let task = tokio::spawn(run_session(context, control_rx, state_tx));
    SessionHandle {
        control,
        state,
        task,
    }
}

struct StateReporter {
    tenant: TenantId,
    sender: watch::Sender<BotState>,
}

impl StateReporter {
    fn set(&self, next: BotState, reason: &str) {
        let previous = *self.sender.borrow();
        if previous != next || next == BotState::Backoff {
            TenantLogger::log_bot_transition(
                self.tenant.as_str(),
                &previous.to_string(),
                &next.to_string(),
                reason,
            );
        }
        self.sender.send_replace(next);
    }
}

enum ConnectedExit {
    Disabled,
    Lost(String),
}

async fn run_session(
    context: SessionContext,
    mut control: mpsc::Receiver<SessionControl>,
    state: watch::Sender<BotState>,
) {
    let reporter = StateReporter {
        tenant: context.tenant.clone(),
        sender: state,
    };
    let backoff = Backoff::from_millis(context.config.backoff_base_ms, context.config.backoff_max_ms);
    let mut failures: u32 = 0;
    reporter.set(BotState::Connecting, "enabled");

    loop {
        let connect = timeout(
            context.config.connect_timeout(),
            context.transport.connect(&context.credentials),
        );
        let attempt = tokio::select! {
            _ = control.recv() => {
                reporter.set(BotState::Disabled, "disabled while connecting");
                return;
            }
            attempt = connect => attempt,
        };

        let reason = match attempt {
            Ok(Ok(connection)) => {
                reporter.set(BotState::Connected, "handshake complete");
                let connected_at = Instant::now();
                match run_connected(&context, connection, &mut control).await {
                    ConnectedExit::Disabled => {
                        reporter.set(BotState::Disabled, "disabled");
                        return;
                    }
                    ConnectedExit::Lost(reason) => {
                        // A server that accepts and then hangs up is not a recovery
                        if connected_at.elapsed() >= context.config.stable_connection() {
                            failures = 0;
                        } else {
                            failures += 1;
                        }
                        reason
                    }
                }
            }
            Ok(Err(ChatError::AuthenticationFailed(notice))) => {
                reporter.set(BotState::Error, &format!("authentication failed: {notice}"));
                return;
            }
            Ok(Err(e)) => {
                failures += 1;
                e.to_string()
            }
            Err(_) => {
                failures += 1;
                "connect timed out".to_owned()
            }
        };

        if failures >= context.config.max_consecutive_failures.max(1) {
            reporter.set(
                BotState::Error,
                &format!("{failures} consecutive connect failures, last: {reason}"),
            );
            return;
        }

        reporter.set(BotState::Backoff, &reason);
        let delay = backoff.delay(failures.max(1));
        tokio::select! {
            _ = control.recv() => {
                reporter.set(BotState::Disabled, "disabled during backoff");
                return;
            }
            () = sleep(delay) => {}
        }
        reporter.set(BotState::Connecting, "backoff elapsed");
    }
}

async fn run_connected(
    context: &SessionContext,
    mut connection: Box<dyn ChatConnection>,
    control: &mut mpsc::Receiver<SessionControl>,
) -> ConnectedExit {
    let (outbox_tx, mut outbox_rx) = mpsc::channel(channels::CHAT_OUTBOX_BUFFER);
    let registration = context.outbox.register(&context.tenant, outbox_tx);

    let exit = loop {
        tokio::select! {
            _ = control.recv() => {
                connection.close().await;
                break ConnectedExit::Disabled;
            }
            Some(text) = outbox_rx.recv() => {
                if let Err(e) = connection.send(&text).await {
                    break ConnectedExit::Lost(e.to_string());
                }
            }
            message = connection.next_message() => match message {
                Ok(Some(message)) => {
                    if let Some(reply) = context.handler.handle_chat(&context.tenant, &message).await {
                        if let Err(e) = connection.send(&reply).await {
                            break ConnectedExit::Lost(e.to_string());
                        }
                    }
                }
                Ok(None) => break ConnectedExit::Lost("connection closed".to_owned()),
                Err(e) => {
                    warn!(tenant_id = %context.tenant, error = %e, "Chat connection lost");
                    break ConnectedExit::Lost(e.to_string());
                }
            },
        }
    };

    context.outbox.unregister(&context.tenant, registration);
    exit
}
