// ABOUTME: Shared test utilities and fakes for integration tests
// ABOUTME: Provides logging setup, a recording webhook sink, a scripted chat transport, and resource builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `tallyhub_server`
//!
//! Everything outbound (Discord, Twitch) is replaced by in-process fakes so the full
//! mutation pipeline runs offline.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tallyhub_core::models::{CounterSnapshot, CounterValue, TenantId};
use tallyhub_server::bot::{
    BotCredentials, ChatConnection, ChatError, ChatMessage, ChatRoles, ChatTransport,
};
use tallyhub_server::config::{BotConfig, HttpClientConfig, ServerConfig};
use tallyhub_server::resources::{ServerResources, ServerResourcesBuilder};
use tallyhub_server::routes;
use tallyhub_server::store::{CounterStore, MemoryStore};
use tallyhub_server::webhook::{DeliveryOutcome, DeliveryRecord, WebhookJob, WebhookSink};
use tokio::sync::{mpsc, Notify};

static INIT_LOGGER: Once = Once::new();

/// Webhook URL accepted by validation
pub const DISCORD_WEBHOOK: &str = "https://discord.com/api/webhooks/1234/test-token";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Parse a tenant id
pub fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).unwrap()
}

/// Configuration with fast retries and reconnects
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_client: HttpClientConfig {
            webhook_timeout_secs: 2,
            webhook_connect_timeout_secs: 1,
            max_attempts: 3,
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 40,
        },
        bot: BotConfig {
            irc_url: "ws://127.0.0.1:9".into(),
            connect_timeout_secs: 1,
            backoff_base_ms: 5,
            backoff_max_ms: 20,
            max_consecutive_failures: 3,
            stable_connection_ms: 500,
        },
        ..ServerConfig::default()
    }
}

/// Webhook sink that records jobs instead of sending them
#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<WebhookJob>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn jobs(&self) -> Vec<WebhookJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Wait until at least `expected` jobs were recorded, then let stragglers land
    pub async fn wait_for(&self, expected: usize) -> Vec<WebhookJob> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.count() < expected && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.jobs()
    }
}

#[async_trait]
impl WebhookSink for RecordingSink {
    async fn deliver(&self, job: WebhookJob) -> DeliveryRecord {
        let record = DeliveryRecord {
            tenant_id: job.tenant_id.clone(),
            attempts: 1,
            last_status: Some(204),
            outcome: DeliveryOutcome::Delivered { status: 204 },
        };
        self.jobs.lock().unwrap().push(job);
        record
    }
}

/// In-memory store whose counter writes can be made to fail or stall
#[derive(Default)]
pub struct ControlledStore {
    inner: MemoryStore,
    fail_counter_writes: AtomicBool,
    counter_write_delay_ms: AtomicU64,
}

impl ControlledStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every counter write fail
    pub fn fail_counter_writes(&self, fail: bool) {
        self.fail_counter_writes.store(fail, Ordering::SeqCst);
    }

    /// Stall every counter write before it lands
    pub fn delay_counter_writes(&self, delay: Duration) {
        self.counter_write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounterStore for ControlledStore {
    async fn get_counter(
        &self,
        tenant: &TenantId,
        counter: &str,
    ) -> anyhow::Result<Option<CounterValue>> {
        self.inner.get_counter(tenant, counter).await
    }

    async fn put_counter(
        &self,
        tenant: &TenantId,
        counter: &str,
        value: CounterValue,
    ) -> anyhow::Result<()> {
        let delay = self.counter_write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_counter_writes.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.put_counter(tenant, counter, value).await
    }

    async fn snapshot(&self, tenant: &TenantId) -> anyhow::Result<CounterSnapshot> {
        self.inner.snapshot(tenant).await
    }

    async fn get_settings(&self, tenant: &TenantId) -> anyhow::Result<Option<Value>> {
        self.inner.get_settings(tenant).await
    }

    async fn put_settings(&self, tenant: &TenantId, settings: Value) -> anyhow::Result<()> {
        self.inner.put_settings(tenant, settings).await
    }

    async fn remove_tenant(&self, tenant: &TenantId) -> anyhow::Result<()> {
        self.inner.remove_tenant(tenant).await
    }
}

/// How the scripted transport answers one connect call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// Network failure
    Refuse,
    /// Credentials rejected
    RejectAuth,
    /// Handshake succeeds
    Accept,
    /// Handshake succeeds, then the server closes the connection at once
    Hangup,
}

/// Test-side end of an accepted fake chat connection
pub struct FakeChannel {
    inbound: mpsc::UnboundedSender<ChatMessage>,
    sent: mpsc::UnboundedReceiver<String>,
    closed: Arc<Notify>,
}

impl FakeChannel {
    /// Deliver a chat line as if a viewer typed it
    pub fn say(&self, sender: &str, text: &str, roles: ChatRoles) {
        self.inbound
            .send(ChatMessage {
                channel: "streamer".into(),
                sender: sender.into(),
                text: text.into(),
                roles,
            })
            .unwrap();
    }

    /// Next message the session sent to chat
    pub async fn next_sent(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(2), self.sent.recv())
            .await
            .ok()
            .flatten()
    }

    /// Assert nothing is sent for a short while
    pub async fn assert_silent(&mut self) {
        let sent = tokio::time::timeout(Duration::from_millis(150), self.sent.recv()).await;
        assert!(sent.is_err(), "unexpected chat message: {sent:?}");
    }

    /// Wait until the session closed the connection
    pub async fn wait_closed(&self) -> bool {
        tokio::time::timeout(Duration::from_secs(2), self.closed.notified())
            .await
            .is_ok()
    }
}

struct FakeConnection {
    inbound: mpsc::UnboundedReceiver<ChatMessage>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<Notify>,
}

#[async_trait]
impl ChatConnection for FakeConnection {
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError> {
        Ok(self.inbound.recv().await)
    }

    async fn send(&mut self, text: &str) -> Result<(), ChatError> {
        self.sent
            .send(text.to_owned())
            .map_err(|_| ChatError::Closed("test side dropped".into()))
    }

    async fn close(&mut self) {
        self.closed.notify_one();
    }
}

/// Chat transport following a script of connect outcomes
///
/// Once the script runs out every further connect is refused.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<ConnectStep>>,
    attempts: AtomicU32,
    channels_tx: mpsc::UnboundedSender<FakeChannel>,
    channels_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<FakeChannel>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = ConnectStep>) -> Arc<Self> {
        let (channels_tx, channels_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            attempts: AtomicU32::new(0),
            channels_tx,
            channels_rx: tokio::sync::Mutex::new(channels_rx),
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Test-side end of the next accepted connection
    pub async fn next_channel(&self) -> FakeChannel {
        let mut rx = self.channels_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no connection accepted in time")
            .expect("transport dropped")
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn connect(
        &self,
        _credentials: &BotCredentials,
    ) -> Result<Box<dyn ChatConnection>, ChatError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectStep::Refuse);
        match step {
            ConnectStep::Refuse => Err(ChatError::Transport("connection refused".into())),
            ConnectStep::RejectAuth => Err(ChatError::AuthenticationFailed(
                "Login authentication failed".into(),
            )),
            ConnectStep::Accept => {
                let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
                let (sent_tx, sent_rx) = mpsc::unbounded_channel();
                let closed = Arc::new(Notify::new());
                let _ = self.channels_tx.send(FakeChannel {
                    inbound: inbound_tx,
                    sent: sent_rx,
                    closed: Arc::clone(&closed),
                });
                Ok(Box::new(FakeConnection {
                    inbound: inbound_rx,
                    sent: sent_tx,
                    closed,
                }))
            }
            ConnectStep::Hangup => {
                let (_, inbound_rx) = mpsc::unbounded_channel();
                let (sent_tx, _) = mpsc::unbounded_channel();
                Ok(Box::new(FakeConnection {
                    inbound: inbound_rx,
                    sent: sent_tx,
                    closed: Arc::new(Notify::new()),
                }))
            }
        }
    }
}

/// Bot credentials for tests
pub fn credentials() -> BotCredentials {
    BotCredentials {
        login: "tallybot".into(),
        oauth_token: "oauth:secret".into(),
        channel: "streamer".into(),
    }
}

/// Roles of an ordinary viewer
pub const fn viewer() -> ChatRoles {
    ChatRoles {
        broadcaster: false,
        moderator: false,
        vip: false,
        subscriber: false,
    }
}

/// Roles of a moderator
pub const fn moderator() -> ChatRoles {
    ChatRoles {
        broadcaster: false,
        moderator: true,
        vip: false,
        subscriber: false,
    }
}

/// Resources wired to the recording sink and a scripted transport
pub fn create_test_resources(
    sink: Arc<RecordingSink>,
    transport: Arc<ScriptedTransport>,
) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(
        ServerResourcesBuilder::new()
            .with_config(test_config())
            .with_webhook_sink(sink)
            .with_chat_transport(transport)
            .build(),
    )
}

/// Resources with fakes nobody inspects
pub fn create_offline_resources() -> Arc<ServerResources> {
    create_test_resources(RecordingSink::new(), ScriptedTransport::new([]))
}

/// Serve the full router on an ephemeral port
pub async fn spawn_server(resources: &Arc<ServerResources>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::router(resources);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
