// ABOUTME: Core data models shared by the counter engine, router, and adapters
// ABOUTME: Re-exports tenant ids, counter definitions, thresholds, and tenant settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Counter definitions and snapshots
pub mod counter;
/// Milestone thresholds and per-counter configuration
pub mod milestone;
/// Notification preferences and webhook destinations
pub mod notification;
/// Versioned tenant settings
pub mod settings;
/// Tenant identifier newtype
pub mod tenant;

pub use counter::{CounterDefinition, CounterSnapshot, CounterValue, CustomCounter};
pub use milestone::{MilestoneConfig, Thresholds};
pub use notification::{NotificationPreferences, TemplateStyle, WebhookUrl};
pub use settings::{BotSettings, TenantSettings, SETTINGS_VERSION};
pub use tenant::TenantId;
