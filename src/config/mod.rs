// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Exposes the typed ServerConfig and its sub-configurations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Environment-based configuration loading
pub mod environment;

pub use environment::{BotConfig, Environment, HttpClientConfig, ServerConfig, StoreUrl};
