// ABOUTME: Shared server resources container wiring store, fan-out, counters, and bot sessions
// ABOUTME: Built once at startup and handed to every route as Arc<ServerResources>
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Server Resources
//!
//! Every long-lived component is created exactly once here and shared through `Arc`.
//! Outbound collaborators (webhook sink, chat transport, store) can be swapped through
//! [`ServerResourcesBuilder`], which is how tests run the full pipeline offline.

use crate::bot::{BotSessionManager, ChatOutbox, ChatTransport, CommandHandler, TwitchTransport};
use crate::config::ServerConfig;
use crate::counters::CounterService;
use crate::errors::AppResult;
use crate::notifications::NotificationFanout;
use crate::realtime::Broadcaster;
use crate::store::{CounterStore, MemoryStore};
use crate::webhook::{DispatchGate, WebhookDispatcher, WebhookSink};
use std::sync::Arc;
use tallyhub_core::models::TenantId;
use tracing::info;

/// Centralized resource container for dependency injection
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Counter store
    pub store: Arc<dyn CounterStore>,
    /// Overlay broadcaster
    pub broadcaster: Arc<Broadcaster>,
    /// Outbound chat queues
    pub outbox: Arc<ChatOutbox>,
    /// Webhook cancellation gate
    pub gate: Arc<DispatchGate>,
    /// Counter mutation pipeline
    pub counters: Arc<CounterService>,
    /// Chat bot sessions
    pub bots: Arc<BotSessionManager>,
}

impl ServerResources {
    /// Wire production components for a configuration and store
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn CounterStore>) -> Self {
        ServerResourcesBuilder::new()
            .with_config(config)
            .with_store(store)
            .build()
    }

    /// Remove every trace of a tenant
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store delete fails
    pub async fn remove_tenant(&self, tenant: &TenantId) -> AppResult<()> {
        self.bots.remove_tenant(tenant).await;
        self.broadcaster.remove_tenant(tenant);
        self.counters.remove_tenant(tenant).await?;
        info!(tenant_id = %tenant, "Tenant removed");
        Ok(())
    }

    /// Stop background sessions
    pub async fn shutdown(&self) {
        self.bots.shutdown().await;
    }
}

/// Builder for [`ServerResources`]
#[derive(Default)]
pub struct ServerResourcesBuilder {
    config: Option<ServerConfig>,
    store: Option<Arc<dyn CounterStore>>,
    webhook_sink: Option<Arc<dyn WebhookSink>>,
    chat_transport: Option<Arc<dyn ChatTransport>>,
    broadcaster: Option<Arc<Broadcaster>>,
}

impl ServerResourcesBuilder {
    /// Builder with production defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the counter store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the webhook dispatcher
    #[must_use]
    pub fn with_webhook_sink(mut self, sink: Arc<dyn WebhookSink>) -> Self {
        self.webhook_sink = Some(sink);
        self
    }

    /// Replace the Twitch chat transport
    #[must_use]
    pub fn with_chat_transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.chat_transport = Some(transport);
        self
    }

    /// Replace the overlay broadcaster
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Wire everything together
    #[must_use]
    pub fn build(self) -> ServerResources {
        let config = Arc::new(self.config.unwrap_or_default());
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let gate = Arc::new(DispatchGate::new());
        let broadcaster = self.broadcaster.unwrap_or_default();
        let outbox = Arc::new(ChatOutbox::new());

        let webhook_sink = self.webhook_sink.unwrap_or_else(|| {
            Arc::new(WebhookDispatcher::new(&config.http_client, Arc::clone(&gate)))
        });
        let chat_transport = self
            .chat_transport
            .unwrap_or_else(|| Arc::new(TwitchTransport::new(config.bot.irc_url.clone())));

        let fanout = Arc::new(NotificationFanout::new(
            Arc::clone(&broadcaster),
            Arc::clone(&outbox),
            webhook_sink,
            Arc::clone(&gate),
        ));
        let counters = Arc::new(CounterService::new(
            Arc::clone(&store),
            fanout,
            Arc::clone(&gate),
        ));
        let handler: Arc<dyn CommandHandler> = counters.clone();
        let bots = Arc::new(BotSessionManager::new(
            chat_transport,
            handler,
            Arc::clone(&outbox),
            Arc::clone(&gate),
            config.bot.clone(),
        ));

        ServerResources {
            config,
            store,
            broadcaster,
            outbox,
            gate,
            counters,
            bots,
        }
    }
}
