// ABOUTME: Notification routing and fan-out for counter, milestone, and stream events
// ABOUTME: The router plans channels from tenant settings, the fan-out executes a plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Notification events, payloads, and the real-time wire format
pub mod events;
/// Executes dispatch plans against the downstream channels
pub mod fanout;
/// Decides which channels an event reaches
pub mod router;

pub use events::{NotificationEvent, NotificationKind, NotificationPayload, RealtimeEvent, StreamInfo};
pub use fanout::{FanoutReport, NotificationFanout};
pub use router::{route, DispatchChannel, DispatchPlan, WebhookTarget};
