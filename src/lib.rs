// ABOUTME: Main library entry point for the TallyHub stream counter server
// ABOUTME: Counter mutations, milestone fan-out to overlays, Discord webhooks, and chat bots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

#![deny(unsafe_code)]

//! # TallyHub Server
//!
//! Multi-tenant counters for live streamers. A counter change arrives from the HTTP trigger
//! API or from chat, is applied atomically per `(tenant, counter)`, and is then fanned out:
//!
//! - **Overlays** receive a JSON event over the tenant's websocket group
//! - **Discord** receives a rendered webhook message, retried with backoff
//! - **Chat** receives a short reply through the tenant's bot session
//!
//! ## Architecture
//!
//! - **Counters**: Mutation engine, milestone detection, and the service tying them to fan-out
//! - **Notifications**: Event routing per tenant settings and concurrent fan-out
//! - **Webhook**: Discord templates and the retrying dispatcher
//! - **Bot**: Chat command parsing, Twitch IRC transport, and the session state machine
//! - **Realtime**: Per-tenant broadcast groups for overlay websockets
//! - **Store**: Counter and settings persistence (memory or `SQLite`)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tallyhub_server::config::ServerConfig;
//! use tallyhub_server::resources::ServerResources;
//! use tallyhub_server::store::MemoryStore;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let resources = ServerResources::new(ServerConfig::default(), Arc::new(MemoryStore::new()));
//! let tenant = tallyhub_core::models::TenantId::parse("1234")?;
//! let outcome = resources.counters.increment(&tenant, "deaths").await?;
//! assert_eq!(outcome.value, 1);
//! # Ok(())
//! # }
//! ```

/// Chat bot sessions, command parsing, and the Twitch transport
pub mod bot;

/// Environment-driven server configuration
pub mod config;

/// Application constants
pub mod constants;

/// Counter mutation engine, milestone detection, and counter service
pub mod counters;

/// Error types re-exported from the core crate
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Notification events, routing, and fan-out
pub mod notifications;

/// Overlay broadcast groups and websocket handling
pub mod realtime;

/// Shared server resources
pub mod resources;

/// HTTP routes
pub mod routes;

/// Tenant settings load, save, and legacy migration
pub mod settings;

/// Counter and settings persistence
pub mod store;

/// HTTP client and backoff helpers
pub mod utils;

/// Discord webhook rendering and delivery
pub mod webhook;
