// ABOUTME: Overlay websocket route streaming a tenant's real-time events
// ABOUTME: Upgrades the connection and hands it to the realtime connection loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant_from_path;
use crate::errors::AppError;
use crate::realtime::handle_overlay_connection;
use crate::resources::ServerResources;
use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// WebSocket routes implementation
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Create the overlay websocket route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ws/tenants/:tenant_id", get(Self::handle_websocket))
            .with_state(resources)
    }

    async fn handle_websocket(
        ws: WebSocketUpgrade,
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        info!(tenant_id = %tenant, "Overlay websocket connection request");
        let broadcaster = Arc::clone(&resources.broadcaster);
        Ok(ws
            .on_upgrade(move |socket| handle_overlay_connection(broadcaster, tenant, socket))
            .into_response())
    }
}
