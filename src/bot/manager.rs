// ABOUTME: Supervising map of per-tenant bot sessions with enable, disable, and shutdown
// ABOUTME: Disabling a tenant stops its session and cancels its pending webhook deliveries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::outbox::ChatOutbox;
use super::session::{spawn_session, BotState, CommandHandler, SessionContext, SessionHandle};
use super::transport::{BotCredentials, ChatTransport};
use crate::config::BotConfig;
use crate::webhook::DispatchGate;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tallyhub_core::models::TenantId;
use tokio::sync::watch;
use tracing::info;

const STOP_GRACE: Duration = Duration::from_secs(5);

/// Owns one session handle per tenant
pub struct BotSessionManager {
    sessions: DashMap<TenantId, SessionHandle>,
    transport: Arc<dyn ChatTransport>,
    handler: Arc<dyn CommandHandler>,
    outbox: Arc<ChatOutbox>,
    gate: Arc<DispatchGate>,
    config: BotConfig,
}

impl BotSessionManager {
    /// Create a manager
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        handler: Arc<dyn CommandHandler>,
        outbox: Arc<ChatOutbox>,
        gate: Arc<DispatchGate>,
        config: BotConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            transport,
            handler,
            outbox,
            gate,
            config,
        }
    }

    /// Start a session for a tenant
    ///
    /// Idempotent while a session is active; a session in `Error` is replaced.
    pub fn enable(&self, tenant: &TenantId, credentials: BotCredentials) -> BotState {
        if let Some(existing) = self.sessions.get(tenant) {
            if existing.state().is_active() && !existing.is_finished() {
                return existing.state();
            }
        }
        let handle = spawn_session(SessionContext {
            tenant: tenant.clone(),
            credentials,
            transport: Arc::clone(&self.transport),
            handler: Arc::clone(&self.handler),
            outbox: Arc::clone(&self.outbox),
            config: self.config.clone(),
        });
        let state = handle.state();
        if let Some(stale) = self.sessions.insert(tenant.clone(), handle) {
            tokio::spawn(stale.stop(STOP_GRACE));
        }
        info!(tenant_id = %tenant, "Bot session enabled");
        state
    }

    /// Stop a tenant's session and drop its pending webhook deliveries
    pub async fn disable(&self, tenant: &TenantId) -> BotState {
        self.gate.cancel(tenant);
        if let Some((_, handle)) = self.sessions.remove(tenant) {
            handle.stop(STOP_GRACE).await;
            info!(tenant_id = %tenant, "Bot session disabled");
        }
        BotState::Disabled
    }

    /// Current state of a tenant's session
    #[must_use]
    pub fn state(&self, tenant: &TenantId) -> BotState {
        self.sessions
            .get(tenant)
            .map_or(BotState::Disabled, |handle| handle.state())
    }

    /// Watch a tenant's state transitions
    #[must_use]
    pub fn watch(&self, tenant: &TenantId) -> Option<watch::Receiver<BotState>> {
        self.sessions.get(tenant).map(|handle| handle.subscribe())
    }

    /// Forget a tenant entirely
    pub async fn remove_tenant(&self, tenant: &TenantId) {
        self.disable(tenant).await;
        self.outbox.remove_tenant(tenant);
    }

    /// Stop every session
    pub async fn shutdown(&self) {
        let tenants: Vec<TenantId> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        for tenant in &tenants {
            if let Some((_, handle)) = self.sessions.remove(tenant) {
                handle.stop(STOP_GRACE).await;
            }
        }
        info!(sessions = tenants.len(), "Bot sessions shut down");
    }

    /// Number of tenants with a session handle
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
