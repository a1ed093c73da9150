// ABOUTME: Bot control routes to enable, disable, and inspect a tenant's chat session
// ABOUTME: Enabling persists the bot flag and starts a session with caller-supplied credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant_from_path;
use crate::bot::{BotCredentials, BotState};
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tallyhub_core::models::TenantId;

/// Bot status body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatusResponse {
    /// Tenant
    pub tenant_id: TenantId,
    /// Session state
    pub state: BotState,
    /// Persisted bot flag
    pub enabled: bool,
}

/// Bot routes implementation
pub struct BotRoutes;

impl BotRoutes {
    /// Create all bot routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tenants/:tenant_id/bot", get(Self::handle_status))
            .route("/api/tenants/:tenant_id/bot/enable", post(Self::handle_enable))
            .route("/api/tenants/:tenant_id/bot/disable", post(Self::handle_disable))
            .with_state(resources)
    }

    async fn handle_status(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let settings = resources.counters.settings(&tenant).await?;
        Ok(Json(BotStatusResponse {
            state: resources.bots.state(&tenant),
            tenant_id: tenant,
            enabled: settings.bot.enabled,
        })
        .into_response())
    }

    async fn handle_enable(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
        Json(credentials): Json<BotCredentials>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        if credentials.login.trim().is_empty() || credentials.channel.trim().is_empty() {
            return Err(AppError::invalid_input("login and channel are required"));
        }
        let mut settings = resources.counters.settings(&tenant).await?;
        if !settings.bot.enabled {
            settings.bot.enabled = true;
            resources.counters.save_settings(&tenant, &settings).await?;
        }
        let state = resources.bots.enable(&tenant, credentials);
        Ok(Json(BotStatusResponse {
            tenant_id: tenant,
            state,
            enabled: true,
        })
        .into_response())
    }

    async fn handle_disable(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let mut settings = resources.counters.settings(&tenant).await?;
        if settings.bot.enabled {
            settings.bot.enabled = false;
            resources.counters.save_settings(&tenant, &settings).await?;
        }
        let state = resources.bots.disable(&tenant).await;
        Ok(Json(BotStatusResponse {
            tenant_id: tenant,
            state,
            enabled: false,
        })
        .into_response())
    }
}
