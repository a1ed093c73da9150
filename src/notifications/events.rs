// ABOUTME: Notification events emitted by the counter pipeline and their channel payloads
// ABOUTME: Includes the camelCase JSON format pushed to overlay subscribers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::counters::MutationOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tallyhub_core::models::{CounterDefinition, TenantId};

/// Stream status carried by stream events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Whether the stream is live
    pub live: bool,
    /// Stream title, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Something that happened to a tenant and may need to be announced
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A counter changed
    MutationApplied(MutationOutcome),
    /// A counter crossed one milestone threshold
    MilestoneCrossed {
        /// The mutation that crossed it
        outcome: MutationOutcome,
        /// The threshold crossed
        threshold: u64,
    },
    /// The tenant's stream went online or offline
    StreamStateChanged(StreamInfo),
}

/// Kind of a notification payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Counter value update
    CounterUpdate,
    /// Milestone reached
    MilestoneReached,
    /// Stream went live
    StreamOnline,
    /// Stream ended
    StreamOffline,
}

/// Channel-independent notification content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Payload kind
    pub kind: NotificationKind,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Counter key, for counter events
    pub counter: Option<String>,
    /// Value before the mutation
    pub previous: Option<u64>,
    /// Value after the mutation
    pub value: Option<u64>,
    /// Signed change
    pub change: Option<i64>,
    /// Crossed threshold, for milestones
    pub threshold: Option<u64>,
    /// Counter display name
    pub display_name: Option<String>,
    /// Counter icon
    pub icon: Option<String>,
    /// Stream details, for stream events
    pub stream: Option<StreamInfo>,
    /// When the event happened
    pub occurred_at: DateTime<Utc>,
}

impl NotificationPayload {
    /// Build the payload for an event
    #[must_use]
    pub fn from_event(
        tenant: &TenantId,
        event: &NotificationEvent,
        display: Option<&CounterDefinition>,
    ) -> Self {
        let mut payload = Self {
            kind: NotificationKind::CounterUpdate,
            tenant_id: tenant.clone(),
            counter: None,
            previous: None,
            value: None,
            change: None,
            threshold: None,
            display_name: display.map(|d| d.display_name.clone()),
            icon: display.map(|d| d.icon.clone()),
            stream: None,
            occurred_at: Utc::now(),
        };
        match event {
            NotificationEvent::MutationApplied(outcome) => payload.fill_counter(outcome),
            NotificationEvent::MilestoneCrossed { outcome, threshold } => {
                payload.fill_counter(outcome);
                payload.kind = NotificationKind::MilestoneReached;
                payload.threshold = Some(*threshold);
            }
            NotificationEvent::StreamStateChanged(info) => {
                payload.kind = if info.live {
                    NotificationKind::StreamOnline
                } else {
                    NotificationKind::StreamOffline
                };
                payload.stream = Some(info.clone());
            }
        }
        payload
    }

    fn fill_counter(&mut self, outcome: &MutationOutcome) {
        self.counter = Some(outcome.counter.clone());
        self.previous = Some(outcome.previous);
        self.value = Some(outcome.value);
        self.change = Some(outcome.change);
        self.occurred_at = outcome.updated_at;
    }
}

/// Event pushed to overlay subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    /// `counterUpdate`, `milestoneReached` or `streamStatus`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Counter key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<String>,
    /// Counter value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    /// Signed change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<i64>,
    /// Crossed threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    /// Counter icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Counter display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Stream status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,
}

impl RealtimeEvent {
    /// Counter update event type
    pub const COUNTER_UPDATE: &'static str = "counterUpdate";
    /// Milestone event type
    pub const MILESTONE_REACHED: &'static str = "milestoneReached";
    /// Stream status event type
    pub const STREAM_STATUS: &'static str = "streamStatus";

    /// Overlay view of a payload
    #[must_use]
    pub fn from_payload(payload: &NotificationPayload) -> Self {
        let event_type = match payload.kind {
            NotificationKind::CounterUpdate => Self::COUNTER_UPDATE,
            NotificationKind::MilestoneReached => Self::MILESTONE_REACHED,
            NotificationKind::StreamOnline | NotificationKind::StreamOffline => Self::STREAM_STATUS,
        };
        Self {
            event_type: event_type.to_owned(),
            tenant_id: payload.tenant_id.clone(),
            counter: payload.counter.clone(),
            value: payload.value,
            change: payload.change,
            threshold: payload.threshold,
            icon: payload.icon.clone(),
            name: payload.display_name.clone(),
            live: payload.stream.as_ref().map(|stream| stream.live),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::MutationKind;
    use serde_json::json;

    #[test]
    fn test_realtime_json_shape() {
        let tenant = TenantId::parse("t1").unwrap();
        let outcome = MutationOutcome {
            tenant_id: tenant.clone(),
            counter: "deaths".into(),
            kind: MutationKind::Increment,
            previous: 9,
            value: 10,
            change: 1,
            crossed: vec![10],
            updated_at: Utc::now(),
        };
        let deaths = CounterDefinition::builtin("deaths").unwrap();
        let payload = NotificationPayload::from_event(
            &tenant,
            &NotificationEvent::MilestoneCrossed {
                outcome,
                threshold: 10,
            },
            Some(&deaths),
        );
        let json = serde_json::to_value(RealtimeEvent::from_payload(&payload)).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "milestoneReached",
                "tenantId": "t1",
                "counter": "deaths",
                "value": 10,
                "change": 1,
                "threshold": 10,
                "icon": "💀",
                "name": "Deaths"
            })
        );
    }
}
