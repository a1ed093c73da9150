// ABOUTME: Real-time push of counter, milestone, and stream events to overlay subscribers
// ABOUTME: Tenant-scoped subscriber groups plus the websocket connection handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Per-tenant subscriber groups
pub mod broadcaster;
/// Overlay websocket connection handling
pub mod websocket;

pub use broadcaster::{Broadcaster, PublishReport};
pub use websocket::handle_overlay_connection;
