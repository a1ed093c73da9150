// ABOUTME: Webhook dispatcher posting rendered Discord messages with bounded caller-side retry
// ABOUTME: Produces delivery records; failures are logged and never reach the mutation caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Webhook Dispatcher
//!
//! [`WebhookDispatcher::dispatch`] performs exactly one HTTP POST. Retrying is the
//! caller's decision: [`WebhookDispatcher::dispatch_with_retry`] re-invokes `dispatch`
//! for transient failures (transport errors, timeouts, 429, 5xx) with exponential
//! backoff. Before every attempt the [`DispatchGate`] is consulted so that jobs queued
//! before a tenant was disabled are dropped. Deliveries are not deduplicated: a retry
//! after a timeout whose request actually arrived produces a duplicate message.

use super::gate::DispatchGate;
use super::templates::render;
use crate::config::HttpClientConfig;
use crate::logging::TenantLogger;
use crate::notifications::{NotificationPayload, WebhookTarget};
use crate::utils::backoff::Backoff;
use crate::utils::http_client::webhook_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tallyhub_core::constants::webhook;
use tallyhub_core::models::TenantId;
use tracing::debug;

/// Result of one delivery attempt, or of a whole delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The provider accepted the message
    Delivered {
        /// HTTP status returned
        status: u16,
    },
    /// The attempt failed
    Failed {
        /// HTTP status, `None` for transport errors and timeouts
        status: Option<u16>,
        /// Truncated response body or transport error text
        body: String,
    },
    /// The tenant was disabled before the attempt started
    Cancelled,
}

impl DeliveryOutcome {
    /// Whether another attempt could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Failed { status: None, .. } => true,
            Self::Failed {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            Self::Delivered { .. } | Self::Cancelled => false,
        }
    }

    /// HTTP status of the attempt, when one was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Delivered { status } => Some(*status),
            Self::Failed { status, .. } => *status,
            Self::Cancelled => None,
        }
    }
}

/// Terminal record of a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryRecord {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// HTTP attempts made
    pub attempts: u32,
    /// Last HTTP status received
    pub last_status: Option<u16>,
    /// Final outcome
    pub outcome: DeliveryOutcome,
}

impl DeliveryRecord {
    /// Whether the message was delivered
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }
}

/// One webhook delivery to perform
#[derive(Debug, Clone)]
pub struct WebhookJob {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Destination and style
    pub target: WebhookTarget,
    /// Content
    pub payload: NotificationPayload,
    /// Dispatch gate epoch at planning time
    pub epoch: u64,
}

/// Anything that can carry out webhook jobs
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Deliver a job to completion (including retries) and report the result
    async fn deliver(&self, job: WebhookJob) -> DeliveryRecord;
}

/// reqwest-backed Discord webhook dispatcher
pub struct WebhookDispatcher {
    client: Client,
    gate: Arc<DispatchGate>,
    max_attempts: u32,
    backoff: Backoff,
    origin_override: Option<String>,
}

impl WebhookDispatcher {
    /// Dispatcher with a client built from configuration
    #[must_use]
    pub fn new(config: &HttpClientConfig, gate: Arc<DispatchGate>) -> Self {
        Self::with_client(webhook_client(config), config, gate)
    }

    /// Dispatcher over an existing client
    #[must_use]
    pub fn with_client(client: Client, config: &HttpClientConfig, gate: Arc<DispatchGate>) -> Self {
        Self {
            client,
            gate,
            max_attempts: config.max_attempts.max(1),
            backoff: Backoff::from_millis(config.retry_base_delay_ms, config.retry_max_delay_ms),
            origin_override: None,
        }
    }

    /// Send every request to `origin` (scheme, host, port) instead of the provider,
    /// keeping the webhook path. Used for egress proxies and local test servers.
    #[must_use]
    pub fn with_origin_override(mut self, origin: impl Into<String>) -> Self {
        self.origin_override = Some(origin.into().trim_end_matches('/').to_owned());
        self
    }

    fn request_url(&self, target: &WebhookTarget) -> String {
        let Some(origin) = &self.origin_override else {
            return target.url.as_str().to_owned();
        };
        url::Url::parse(target.url.as_str()).map_or_else(
            |_| target.url.as_str().to_owned(),
            |parsed| format!("{origin}{}", parsed.path()),
        )
    }

    /// Post one rendered message, exactly one HTTP attempt
    pub async fn dispatch(
        &self,
        tenant: &TenantId,
        target: &WebhookTarget,
        payload: &NotificationPayload,
    ) -> DeliveryOutcome {
        let message = render(
            payload,
            target.style,
            target.channel_url.as_deref(),
            target.image_url.as_deref(),
        );
        let response = match self
            .client
            .post(self.request_url(target))
            .json(&message)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(tenant_id = %tenant, error = %e, timeout = e.is_timeout(), "Webhook transport error");
                return DeliveryOutcome::Failed {
                    status: None,
                    body: e.to_string(),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryOutcome::Delivered {
                status: status.as_u16(),
            };
        }
        let body = response.text().await.unwrap_or_default();
        DeliveryOutcome::Failed {
            status: Some(status.as_u16()),
            body: truncate_body(body),
        }
    }

    /// Dispatch with bounded retry on transient failures
    pub async fn dispatch_with_retry(&self, job: &WebhookJob) -> DeliveryRecord {
        let mut attempts = 0;
        let mut last_status = None;
        let outcome = loop {
            if !self.gate.is_current(&job.tenant_id, job.epoch) {
                break DeliveryOutcome::Cancelled;
            }
            attempts += 1;
            let outcome = self.dispatch(&job.tenant_id, &job.target, &job.payload).await;
            last_status = outcome.status().or(last_status);
            if !outcome.is_transient() || attempts >= self.max_attempts {
                break outcome;
            }
            let delay = self.backoff.delay(attempts);
            debug!(
                tenant_id = %job.tenant_id,
                attempt = attempts,
                status = ?outcome.status(),
                delay_ms = delay.as_millis(),
                "Retrying webhook delivery"
            );
            tokio::time::sleep(delay).await;
        };

        let record = DeliveryRecord {
            tenant_id: job.tenant_id.clone(),
            attempts,
            last_status,
            outcome,
        };
        match &record.outcome {
            DeliveryOutcome::Cancelled => debug!(
                tenant_id = %job.tenant_id,
                attempts,
                "Webhook delivery cancelled"
            ),
            DeliveryOutcome::Failed { body, .. } => TenantLogger::log_delivery(
                job.tenant_id.as_str(),
                attempts,
                last_status,
                false,
                Some(body),
            ),
            DeliveryOutcome::Delivered { .. } => TenantLogger::log_delivery(
                job.tenant_id.as_str(),
                attempts,
                last_status,
                true,
                None,
            ),
        }
        record
    }
}

#[async_trait]
impl WebhookSink for WebhookDispatcher {
    async fn deliver(&self, job: WebhookJob) -> DeliveryRecord {
        self.dispatch_with_retry(&job).await
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > webhook::MAX_DIAGNOSTIC_BODY_BYTES {
        let mut cut = webhook::MAX_DIAGNOSTIC_BODY_BYTES;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
