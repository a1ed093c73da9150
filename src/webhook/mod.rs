// ABOUTME: Discord webhook delivery: embed templates, HTTP dispatch with bounded retry, cancellation
// ABOUTME: Delivery is best-effort and never reports back to the mutation caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// HTTP dispatch, retry, and delivery records
pub mod dispatcher;
/// Per-tenant cancellation epochs
pub mod gate;
/// Discord message rendering
pub mod templates;

pub use dispatcher::{DeliveryOutcome, DeliveryRecord, WebhookDispatcher, WebhookJob, WebhookSink};
pub use gate::DispatchGate;
pub use templates::{render, DiscordMessage};
