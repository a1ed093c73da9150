// ABOUTME: Re-exports the unified error types from the core crate
// ABOUTME: Keeps `crate::errors::{AppError, AppResult}` paths stable inside the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

pub use tallyhub_core::errors::{AppError, AppResult, ErrorCode, ErrorResponse};
