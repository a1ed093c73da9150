// ABOUTME: Shared HTTP client construction with connection pooling and timeout configuration
// ABOUTME: One client is built at startup and shared by every webhook delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::config::HttpClientConfig;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the custom build fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .user_agent(concat!("tallyhub/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client used for webhook delivery
#[must_use]
pub fn webhook_client(config: &HttpClientConfig) -> Client {
    create_client_with_timeout(
        config.webhook_timeout_secs,
        config.webhook_connect_timeout_secs,
    )
}
