// ABOUTME: Route module organization for the TallyHub HTTP surface
// ABOUTME: Trigger API, settings, stream events, bot control, health, and overlay websocket
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! HTTP routes
//!
//! Each domain module contains only route definitions and thin handlers delegating to
//! [`ServerResources`]. No authentication happens here; requests are expected to arrive
//! through the OAuth-aware edge that owns tenant identity.

use crate::errors::AppResult;
use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tallyhub_core::models::TenantId;

/// Bot session control routes
pub mod bot;
/// Counter trigger and query routes
pub mod counters;
/// Health check routes
pub mod health;
/// Tenant settings routes
pub mod settings;
/// Stream status routes
pub mod stream;
/// Overlay websocket route
pub mod websocket;

pub use bot::BotRoutes;
pub use counters::CounterRoutes;
pub use health::HealthRoutes;
pub use settings::SettingsRoutes;
pub use stream::StreamRoutes;
pub use websocket::WebSocketRoutes;

/// Parse the `:tenant_id` path segment
pub(crate) fn tenant_from_path(raw: &str) -> AppResult<TenantId> {
    TenantId::parse(raw)
}

/// Complete application router
pub fn router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(CounterRoutes::routes(Arc::clone(resources)))
        .merge(SettingsRoutes::routes(Arc::clone(resources)))
        .merge(StreamRoutes::routes(Arc::clone(resources)))
        .merge(BotRoutes::routes(Arc::clone(resources)))
        .merge(WebSocketRoutes::routes(Arc::clone(resources)))
}
