// ABOUTME: Counter trigger API: increment, decrement, reset, and snapshot queries per tenant
// ABOUTME: Responds with the new value and signed change once the change is persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant_from_path;
use crate::counters::MutationOutcome;
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

/// Body returned by every trigger
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// New counter value
    pub value: u64,
    /// Signed change applied
    pub change: i64,
}

impl From<&MutationOutcome> for MutationResponse {
    fn from(outcome: &MutationOutcome) -> Self {
        Self {
            value: outcome.value,
            change: outcome.change,
        }
    }
}

/// Counter routes implementation
pub struct CounterRoutes;

impl CounterRoutes {
    /// Create all counter routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tenants/:tenant_id/counters", get(Self::handle_snapshot))
            .route(
                "/api/tenants/:tenant_id/counters/:counter/increment",
                post(Self::handle_increment),
            )
            .route(
                "/api/tenants/:tenant_id/counters/:counter/decrement",
                post(Self::handle_decrement),
            )
            .route(
                "/api/tenants/:tenant_id/counters/:counter/reset",
                post(Self::handle_reset),
            )
            .with_state(resources)
    }

    async fn handle_increment(
        State(resources): State<Arc<ServerResources>>,
        Path((tenant_id, counter)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let outcome = resources.counters.increment(&tenant, &counter).await?;
        Ok(Json(MutationResponse::from(&outcome)).into_response())
    }

    async fn handle_decrement(
        State(resources): State<Arc<ServerResources>>,
        Path((tenant_id, counter)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let outcome = resources.counters.decrement(&tenant, &counter).await?;
        Ok(Json(MutationResponse::from(&outcome)).into_response())
    }

    async fn handle_reset(
        State(resources): State<Arc<ServerResources>>,
        Path((tenant_id, counter)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let outcome = resources.counters.reset(&tenant, &counter).await?;
        Ok(Json(MutationResponse::from(&outcome)).into_response())
    }

    async fn handle_snapshot(
        State(resources): State<Arc<ServerResources>>,
        Path(tenant_id): Path<String>,
    ) -> Result<Response, AppError> {
        let tenant = tenant_from_path(&tenant_id)?;
        let snapshot = resources.counters.snapshot(&tenant).await?;
        Ok(Json(snapshot).into_response())
    }
}
