// ABOUTME: Stream status route receiving platform online/offline events
// ABOUTME: Announces only actual state changes to overlays and the webhook
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant_from_path;
use crate::errors::AppError;
use crate::notifications::StreamInfo;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

/// Stream routes implementation
pub struct StreamRoutes;

impl StreamRoutes {
    /// Create the stream status route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tenants/:tenant_id/stream", post(Self::handle_stream_status))
            .with_state(resources)
    }

    async fn handle_stream_status(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
        Json(info): Json<StreamInfo>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let live = info.live;
        let changed = resources.counters.set_stream_state(&tenant, info).await?;
        Ok(Json(serde_json::json!({ "live": live, "changed": changed })).into_response())
    }
}
