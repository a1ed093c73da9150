// ABOUTME: Shared helpers for outbound HTTP clients and retry backoff
// ABOUTME: Used by the webhook dispatcher and the bot session supervisor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Exponential backoff with jitter
pub mod backoff;
/// HTTP client construction
pub mod http_client;
