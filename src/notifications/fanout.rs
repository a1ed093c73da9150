// ABOUTME: Executes dispatch plans: overlay publish, chat reply, and spawned webhook delivery
// ABOUTME: Channels are independent; a failing or slow channel never affects the others
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::router::{DispatchChannel, DispatchPlan};
use crate::bot::ChatOutbox;
use crate::realtime::Broadcaster;
use crate::webhook::{DeliveryRecord, DispatchGate, WebhookJob, WebhookSink};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What [`NotificationFanout::deliver`] did with a plan
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Overlay subscribers that received the event
    pub realtime_delivered: usize,
    /// Whether a chat reply was queued
    pub chat_queued: bool,
    /// Spawned webhook delivery, if the plan had one
    pub webhook: Option<JoinHandle<DeliveryRecord>>,
}

/// Fan-out executor shared by every tenant
pub struct NotificationFanout {
    broadcaster: Arc<Broadcaster>,
    outbox: Arc<ChatOutbox>,
    webhooks: Arc<dyn WebhookSink>,
    gate: Arc<DispatchGate>,
}

impl NotificationFanout {
    /// Create a fan-out over the downstream channels
    #[must_use]
    pub fn new(
        broadcaster: Arc<Broadcaster>,
        outbox: Arc<ChatOutbox>,
        webhooks: Arc<dyn WebhookSink>,
        gate: Arc<DispatchGate>,
    ) -> Self {
        Self {
            broadcaster,
            outbox,
            webhooks,
            gate,
        }
    }

    /// Execute a plan without waiting on any network I/O
    pub fn deliver(&self, plan: DispatchPlan) -> FanoutReport {
        let mut report = FanoutReport::default();
        for channel in &plan.channels {
            match channel {
                DispatchChannel::Realtime(event) => {
                    report.realtime_delivered =
                        self.broadcaster.publish(&plan.tenant_id, event).delivered;
                }
                DispatchChannel::ChatReply(text) => {
                    report.chat_queued = self.outbox.send(&plan.tenant_id, text.as_str());
                }
                DispatchChannel::Webhook(target) => {
                    let job = WebhookJob {
                        tenant_id: plan.tenant_id.clone(),
                        target: target.clone(),
                        payload: plan.payload.clone(),
                        epoch: self.gate.current(&plan.tenant_id),
                    };
                    let sink = Arc::clone(&self.webhooks);
                    report.webhook = Some(tokio::spawn(async move { sink.deliver(job).await }));
                }
            }
        }
        report
    }
}
