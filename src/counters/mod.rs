// ABOUTME: Counter mutation pipeline: serialized engine, milestone detection, and service entry point
// ABOUTME: Every trigger source (HTTP, chat, platform events) goes through CounterService
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Per-key serialized mutation engine
pub mod engine;
/// Milestone crossing detection
pub mod milestones;
/// Mutation pipeline shared by every trigger source
pub mod service;

pub use engine::{resolve_mutation, Mutation, MutationEngine, MutationKind, MutationOutcome};
pub use service::CounterService;
