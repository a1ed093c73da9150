// ABOUTME: Overlay websocket connection loop forwarding tenant events as JSON text frames
// ABOUTME: Subscribes on connect, pings idle sockets, and unsubscribes on disconnect
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::Broadcaster;
use crate::constants::timeouts;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tallyhub_core::models::TenantId;
use tokio::time::interval;
use tracing::{debug, warn};
use uuid::Uuid;

/// Serve one overlay connection until either side closes it
pub async fn handle_overlay_connection(
    broadcaster: Arc<Broadcaster>,
    tenant: TenantId,
    socket: WebSocket,
) {
    let connection_id = Uuid::new_v4();
    let mut events = broadcaster.subscribe(&tenant, connection_id);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let send_tenant = tenant.clone();
    let mut send_task = tokio::spawn(async move {
        let mut ping = interval(Duration::from_secs(timeouts::OVERLAY_PING_INTERVAL_SECS));
        ping.tick().await;
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(tenant_id = %send_tenant, error = %e, "Failed to serialize overlay event");
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Overlays only listen; inbound frames matter only for detecting the close
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = ws_rx.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    broadcaster.unsubscribe(&tenant, connection_id);
    debug!(tenant_id = %tenant, %connection_id, "Overlay connection closed");
}
