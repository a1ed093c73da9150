// ABOUTME: Tenant-aware logging utilities for structured, contextual logging
// ABOUTME: Every counter, delivery, and bot event carries the tenant id as a structured field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use tracing::{debug, info, warn};

/// Tenant-aware logging utilities
pub struct TenantLogger;

impl TenantLogger {
    /// Log an applied counter mutation
    pub fn log_mutation(
        tenant_id: &str,
        counter: &str,
        previous: u64,
        value: u64,
        crossed: &[u64],
    ) {
        if crossed.is_empty() {
            debug!(
                tenant_id = %tenant_id,
                counter = %counter,
                previous,
                value,
                event_type = "counter_mutation",
                "Counter mutation applied"
            );
        } else {
            info!(
                tenant_id = %tenant_id,
                counter = %counter,
                previous,
                value,
                crossed = ?crossed,
                event_type = "counter_mutation",
                "Counter mutation crossed milestones"
            );
        }
    }

    /// Log the terminal outcome of a webhook delivery
    pub fn log_delivery(
        tenant_id: &str,
        attempts: u32,
        status: Option<u16>,
        success: bool,
        detail: Option<&str>,
    ) {
        if success {
            info!(
                tenant_id = %tenant_id,
                attempts,
                status = ?status,
                event_type = "webhook_delivery",
                "Webhook delivered"
            );
        } else {
            warn!(
                tenant_id = %tenant_id,
                attempts,
                status = ?status,
                detail = detail.unwrap_or(""),
                event_type = "webhook_delivery",
                "Webhook delivery failed"
            );
        }
    }

    /// Log a bot session state transition
    pub fn log_bot_transition(tenant_id: &str, from: &str, to: &str, reason: &str) {
        info!(
            tenant_id = %tenant_id,
            from = %from,
            to = %to,
            reason = %reason,
            event_type = "bot_session",
            "Bot session state changed"
        );
    }
}
