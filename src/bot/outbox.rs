// ABOUTME: Per-tenant outbound chat queues registered by connected bot sessions
// ABOUTME: Senders never block: full or missing queues drop the message with a warning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use dashmap::DashMap;
use tallyhub_core::models::TenantId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;
use uuid::Uuid;

struct Registration {
    id: Uuid,
    sender: mpsc::Sender<String>,
}

/// Route from fan-out to the session that owns a tenant's chat connection
#[derive(Default)]
pub struct ChatOutbox {
    queues: DashMap<TenantId, Registration>,
}

impl ChatOutbox {
    /// Create an empty outbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the connected session's queue, returning its registration id
    pub fn register(&self, tenant: &TenantId, sender: mpsc::Sender<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.queues
            .insert(tenant.clone(), Registration { id, sender });
        id
    }

    /// Remove a registration, unless a newer session already replaced it
    pub fn unregister(&self, tenant: &TenantId, id: Uuid) {
        self.queues
            .remove_if(tenant, |_, registration| registration.id == id);
    }

    /// Remove whatever queue a tenant has
    pub fn remove_tenant(&self, tenant: &TenantId) {
        self.queues.remove(tenant);
    }

    /// Whether a connected session is registered for the tenant
    #[must_use]
    pub fn is_registered(&self, tenant: &TenantId) -> bool {
        self.queues.contains_key(tenant)
    }

    /// Queue a chat message, returning whether it was accepted
    pub fn send(&self, tenant: &TenantId, text: impl Into<String>) -> bool {
        let Some(registration) = self.queues.get(tenant) else {
            warn!(tenant_id = %tenant, "No connected chat session, dropping chat message");
            return false;
        };
        match registration.sender.try_send(text.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(tenant_id = %tenant, "Chat outbox full, dropping chat message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(tenant_id = %tenant, "Chat session gone, dropping chat message");
                false
            }
        }
    }
}
