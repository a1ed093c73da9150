// ABOUTME: Real-time broadcaster with per-tenant subscriber groups and bounded queues
// ABOUTME: Publishing never blocks: full queues drop the event, closed queues are pruned
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::constants::channels;
use crate::notifications::RealtimeEvent;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tallyhub_core::models::TenantId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Subscriber {
    connection_id: Uuid,
    sender: mpsc::Sender<RealtimeEvent>,
    connected_at: DateTime<Utc>,
}

/// Result of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that accepted the event
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers removed because their connection closed
    pub pruned: usize,
}

/// Tenant-scoped fan-out to overlay connections
pub struct Broadcaster {
    groups: DashMap<TenantId, Vec<Subscriber>>,
    buffer: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    /// Broadcaster with the default per-subscriber buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(channels::SUBSCRIBER_BUFFER)
    }

    /// Broadcaster with a custom per-subscriber buffer
    #[must_use]
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            groups: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber for a tenant's events
    pub fn subscribe(&self, tenant: &TenantId, connection_id: Uuid) -> mpsc::Receiver<RealtimeEvent> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let mut group = self.groups.entry(tenant.clone()).or_default();
        group.retain(|subscriber| subscriber.connection_id != connection_id);
        group.push(Subscriber {
            connection_id,
            sender,
            connected_at: Utc::now(),
        });
        info!(tenant_id = %tenant, %connection_id, subscribers = group.len(), "Overlay subscribed");
        receiver
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, tenant: &TenantId, connection_id: Uuid) {
        let now_empty = self.groups.get_mut(tenant).is_some_and(|mut group| {
            if let Some(subscriber) = group.iter().find(|s| s.connection_id == connection_id) {
                let connected_for = Utc::now() - subscriber.connected_at;
                debug!(
                    tenant_id = %tenant,
                    %connection_id,
                    connected_secs = connected_for.num_seconds(),
                    "Overlay unsubscribed"
                );
            }
            group.retain(|subscriber| subscriber.connection_id != connection_id);
            group.is_empty()
        });
        if now_empty {
            self.groups.remove_if(tenant, |_, group| group.is_empty());
        }
    }

    /// Deliver an event to every current subscriber of its tenant
    pub fn publish(&self, tenant: &TenantId, event: &RealtimeEvent) -> PublishReport {
        let mut report = PublishReport::default();
        let Some(mut group) = self.groups.get_mut(tenant) else {
            return report;
        };

        group.retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                warn!(
                    tenant_id = %tenant,
                    connection_id = %subscriber.connection_id,
                    event_type = %event.event_type,
                    "Overlay queue full, dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                report.pruned += 1;
                false
            }
        });
        let now_empty = group.is_empty();
        drop(group);

        if now_empty {
            self.groups.remove_if(tenant, |_, group| group.is_empty());
        }
        report
    }

    /// Number of subscribers for a tenant
    #[must_use]
    pub fn subscriber_count(&self, tenant: &TenantId) -> usize {
        self.groups.get(tenant).map_or(0, |group| group.len())
    }

    /// Drop every subscriber of a tenant, closing their streams
    pub fn remove_tenant(&self, tenant: &TenantId) {
        self.groups.remove(tenant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tenant: &TenantId, value: u64) -> RealtimeEvent {
        RealtimeEvent {
            event_type: RealtimeEvent::COUNTER_UPDATE.into(),
            tenant_id: tenant.clone(),
            counter: Some("deaths".into()),
            value: Some(value),
            change: Some(1),
            threshold: None,
            icon: None,
            name: None,
            live: None,
        }
    }

    #[tokio::test]
    async fn test_closed_subscriber_is_pruned() {
        let broadcaster = Broadcaster::new();
        let tenant = TenantId::parse("t1").unwrap();
        let receiver = broadcaster.subscribe(&tenant, Uuid::new_v4());
        drop(receiver);

        let report = broadcaster.publish(&tenant, &event(&tenant, 1));
        assert_eq!(report.pruned, 1);
        assert_eq!(broadcaster.subscriber_count(&tenant), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let broadcaster = Broadcaster::new();
        let tenant = TenantId::parse("t1").unwrap();
        let id = Uuid::new_v4();
        let _receiver = broadcaster.subscribe(&tenant, id);
        assert_eq!(broadcaster.subscriber_count(&tenant), 1);
        broadcaster.unsubscribe(&tenant, id);
        assert_eq!(broadcaster.subscriber_count(&tenant), 0);
    }
}
