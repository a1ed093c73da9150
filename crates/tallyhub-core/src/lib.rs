// ABOUTME: Core types and constants for the TallyHub stream counter platform
// ABOUTME: Foundation crate with error handling, counter and settings models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

#![deny(unsafe_code)]

//! # TallyHub Core
//!
//! Foundation crate providing shared types and constants for the TallyHub stream counter
//! platform. It changes infrequently so the server crate compiles incrementally.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Built-in counters, default milestones, webhook and chat constants
//! - **models**: Tenant ids, counter definitions, thresholds, and tenant settings

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (tenants, counters, milestones, notification preferences)
pub mod models;
