// ABOUTME: Counter service wiring the mutation engine to notification routing and fan-out
// ABOUTME: Single entry point for HTTP triggers, chat commands, and platform stream events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Counter Service
//!
//! Every trigger source calls into [`CounterService`]. A mutation is applied by the
//! [`MutationEngine`] and, once persisted, produces one `MutationApplied` dispatch plan
//! followed by one `MilestoneCrossed` plan per crossed threshold in ascending order.
//! Plans are handed to fan-out while the counter's key lock is still held, so overlays
//! see the updates of one counter in the order they were applied.
//! Fan-out is fire-and-forget: the caller gets `{value, change}` as soon as the store
//! write completes.

use super::engine::{resolve_mutation, Mutation, MutationEngine, MutationKind, MutationOutcome};
use crate::bot::commands::{self, ChatCommand, CommandAction};
use crate::bot::{ChatMessage, CommandHandler};
use crate::errors::AppResult;
use crate::notifications::{route, NotificationEvent, NotificationFanout, StreamInfo};
use crate::settings;
use crate::store::CounterStore;
use crate::webhook::DispatchGate;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tallyhub_core::models::{CounterSnapshot, TenantId, TenantSettings};
use tracing::{debug, info, warn};

/// Mutation pipeline shared by every trigger source
pub struct CounterService {
    engine: MutationEngine,
    fanout: Arc<NotificationFanout>,
    gate: Arc<DispatchGate>,
    stream_states: DashMap<TenantId, bool>,
}

impl CounterService {
    /// Create the service
    #[must_use]
    pub fn new(
        store: Arc<dyn CounterStore>,
        fanout: Arc<NotificationFanout>,
        gate: Arc<DispatchGate>,
    ) -> Self {
        Self {
            engine: MutationEngine::new(store),
            fanout,
            gate,
            stream_states: DashMap::new(),
        }
    }

    /// The mutation engine
    #[must_use]
    pub const fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    fn store(&self) -> &dyn CounterStore {
        self.engine.store().as_ref()
    }

    /// Add the counter's increment step
    ///
    /// # Errors
    ///
    /// Returns `InvalidCounter` or `PersistenceFailure`; notifications never fail the call
    pub async fn increment(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        self.apply_kind(tenant, counter, MutationKind::Increment).await
    }

    /// Subtract the counter's decrement step
    ///
    /// # Errors
    ///
    /// See [`CounterService::increment`]
    pub async fn decrement(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        self.apply_kind(tenant, counter, MutationKind::Decrement).await
    }

    /// Reset the counter to zero
    ///
    /// # Errors
    ///
    /// See [`CounterService::increment`]
    pub async fn reset(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        self.apply_kind(tenant, counter, MutationKind::Reset).await
    }

    /// Apply an arbitrary signed delta or reset
    ///
    /// # Errors
    ///
    /// See [`CounterService::increment`]
    pub async fn mutate(
        &self,
        tenant: &TenantId,
        counter: &str,
        mutation: Mutation,
    ) -> AppResult<MutationOutcome> {
        let settings = self.settings(tenant).await?;
        self.apply(tenant, &settings, counter, mutation).await
    }

    async fn apply_kind(
        &self,
        tenant: &TenantId,
        counter: &str,
        kind: MutationKind,
    ) -> AppResult<MutationOutcome> {
        let settings = self.settings(tenant).await?;
        let mutation =
            resolve_mutation(&settings, counter, kind).map_err(|e| e.with_tenant(tenant.as_str()))?;
        self.apply(tenant, &settings, counter, mutation).await
    }

    async fn apply(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
        counter: &str,
        mutation: Mutation,
    ) -> AppResult<MutationOutcome> {
        self.engine
            .mutate_then(tenant, settings, counter, mutation, |outcome| {
                self.announce(settings, outcome);
            })
            .await
    }

    fn announce(&self, settings: &TenantSettings, outcome: &MutationOutcome) {
        let tenant = &outcome.tenant_id;
        let display = settings.counter(&outcome.counter);
        self.fanout.deliver(route(
            tenant,
            &NotificationEvent::MutationApplied(outcome.clone()),
            settings,
            display.as_ref(),
        ));
        for threshold in &outcome.crossed {
            self.fanout.deliver(route(
                tenant,
                &NotificationEvent::MilestoneCrossed {
                    outcome: outcome.clone(),
                    threshold: *threshold,
                },
                settings,
                display.as_ref(),
            ));
        }
    }

    /// Record a stream going online or offline, announcing only actual changes
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the tenant's settings cannot be read
    pub async fn set_stream_state(&self, tenant: &TenantId, info: StreamInfo) -> AppResult<bool> {
        let settings = self.settings(tenant).await?;
        let previous = self.stream_states.insert(tenant.clone(), info.live);
        if previous == Some(info.live) {
            debug!(tenant_id = %tenant, live = info.live, "Stream state unchanged");
            return Ok(false);
        }
        info!(tenant_id = %tenant, live = info.live, "Stream state changed");
        self.fanout.deliver(route(
            tenant,
            &NotificationEvent::StreamStateChanged(info),
            &settings,
            None,
        ));
        Ok(true)
    }

    /// Last known stream state
    #[must_use]
    pub fn is_live(&self, tenant: &TenantId) -> bool {
        self.stream_states.get(tenant).is_some_and(|live| *live)
    }

    /// Every counter of a tenant, including never-touched ones at zero
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store read fails
    pub async fn snapshot(&self, tenant: &TenantId) -> AppResult<CounterSnapshot> {
        let settings = self.settings(tenant).await?;
        let mut snapshot = self.engine.snapshot(tenant).await?;
        for counter in settings.counters() {
            snapshot.counters.entry(counter.key).or_insert(0);
        }
        Ok(snapshot)
    }

    /// Current value of one counter
    ///
    /// # Errors
    ///
    /// Returns `InvalidCounter` or `PersistenceFailure`
    pub async fn query(&self, tenant: &TenantId, counter: &str) -> AppResult<u64> {
        let settings = self.settings(tenant).await?;
        self.engine.query(tenant, &settings, counter).await
    }

    /// Current settings of a tenant
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store read fails
    pub async fn settings(&self, tenant: &TenantId) -> AppResult<TenantSettings> {
        settings::load(self.store(), tenant).await
    }

    /// Replace a tenant's settings from a current or legacy document
    ///
    /// Changing or removing the webhook destination cancels deliveries still queued for
    /// the old one.
    ///
    /// # Errors
    ///
    /// Returns the migration error for invalid documents or `PersistenceFailure`
    pub async fn update_settings(&self, tenant: &TenantId, document: Value) -> AppResult<TenantSettings> {
        let updated = settings::migrate_submitted(document).map_err(|e| e.with_tenant(tenant.as_str()))?;
        self.save_settings(tenant, &updated).await?;
        Ok(updated)
    }

    /// Persist already-typed settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` or `PersistenceFailure`
    pub async fn save_settings(&self, tenant: &TenantId, updated: &TenantSettings) -> AppResult<()> {
        let current = self.settings(tenant).await?;
        settings::save(self.store(), tenant, updated).await?;
        if current.notifications.webhook_url != updated.notifications.webhook_url {
            self.gate.cancel(tenant);
        }
        Ok(())
    }

    /// Delete all state of a tenant and cancel its pending deliveries
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store delete fails
    pub async fn remove_tenant(&self, tenant: &TenantId) -> AppResult<()> {
        self.gate.cancel(tenant);
        self.stream_states.remove(tenant);
        self.engine.remove_tenant(tenant).await
    }

    async fn run_command(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
        command: ChatCommand,
    ) -> AppResult<Option<String>> {
        let label = |key: &str| {
            settings.counter(key).map_or_else(
                || key.to_owned(),
                |d| format!("{} {}", d.icon, d.display_name),
            )
        };
        match command {
            ChatCommand::Query { counter } => {
                let value = self.engine.query(tenant, settings, &counter).await?;
                Ok(Some(format!("{}: {value}", label(&counter))))
            }
            ChatCommand::QueryAll => {
                let snapshot = self.engine.snapshot(tenant).await?;
                let summary: Vec<String> = settings
                    .counters()
                    .iter()
                    .map(|d| format!("{} {}: {}", d.icon, d.display_name, snapshot.value(&d.key)))
                    .collect();
                Ok(Some(summary.join(" | ")))
            }
            ChatCommand::Mutate { counter, action } => {
                let kind = match action {
                    CommandAction::Increment => MutationKind::Increment,
                    CommandAction::Decrement => MutationKind::Decrement,
                    CommandAction::Reset => MutationKind::Reset,
                };
                let mutation = resolve_mutation(settings, &counter, kind)?;
                let outcome = self.apply(tenant, settings, &counter, mutation).await?;
                Ok(settings
                    .bot
                    .echo_mutations
                    .then(|| format!("{}: {}", label(&counter), outcome.value)))
            }
        }
    }
}

#[async_trait]
impl CommandHandler for CounterService {
    async fn handle_chat(&self, tenant: &TenantId, message: &ChatMessage) -> Option<String> {
        let settings = match self.settings(tenant).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(tenant_id = %tenant, error = %e, "Cannot load settings for chat command");
                return None;
            }
        };
        let command = commands::parse(&message.text, &settings.counters())?;
        if !commands::is_authorized(&command, &message.roles, &settings.bot) {
            debug!(tenant_id = %tenant, sender = %message.sender, "Ignoring unauthorized chat command");
            return None;
        }
        match self.run_command(tenant, &settings, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(tenant_id = %tenant, sender = %message.sender, error = %e, "Chat command failed");
                None
            }
        }
    }
}
