// ABOUTME: Tenant settings routes for reading and replacing the settings document
// ABOUTME: PUT accepts the current document or a legacy blob and stores the migrated result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant_from_path;
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Settings routes implementation
pub struct SettingsRoutes;

impl SettingsRoutes {
    /// Create all settings routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/tenants/:tenant_id/settings",
                get(Self::handle_get_settings).put(Self::handle_put_settings),
            )
            .route(
                "/api/tenants/:tenant_id",
                axum::routing::delete(Self::handle_delete_tenant),
            )
            .with_state(resources)
    }

    async fn handle_get_settings(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let settings = resources.counters.settings(&tenant).await?;
        Ok(Json(settings).into_response())
    }

    async fn handle_put_settings(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
        Json(document): Json<Value>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let settings = resources.counters.update_settings(&tenant, document).await?;
        Ok(Json(settings).into_response())
    }

    async fn handle_delete_tenant(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        resources.remove_tenant(&tenant).await?;
        Ok(http::StatusCode::NO_CONTENT.into_response())
    }
}
