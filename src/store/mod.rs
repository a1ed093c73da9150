// ABOUTME: Counter Store abstraction keyed by tenant and context key
// ABOUTME: Last-writer-wins upsert of counter values and raw tenant settings documents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! Counter Store adapter
//!
//! The store is an external collaborator: a key-value store addressed by
//! `(tenant, context key)`. Counters are stored one entry per counter so that two
//! counters of the same tenant can be written concurrently without overwriting each
//! other. Settings are stored as the raw JSON document; migration to the typed
//! [`TenantSettings`](tallyhub_core::models::TenantSettings) happens in
//! [`crate::settings`] where the data enters the core.

use crate::config::StoreUrl;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tallyhub_core::models::{CounterSnapshot, CounterValue, TenantId};

/// In-memory store
pub mod memory;
/// SQLite-backed store
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Context key prefix for counter entries
pub const COUNTER_KEY_PREFIX: &str = "counter:";
/// Context key of the settings document
pub const SETTINGS_KEY: &str = "settings";

/// Context key for a counter entry
#[must_use]
pub fn counter_key(counter: &str) -> String {
    format!("{COUNTER_KEY_PREFIX}{counter}")
}

/// Storage backend for counters and tenant settings
///
/// Implementations must be safe for concurrent use from every tenant. Writes are
/// last-writer-wins upserts; serialization of read-modify-write cycles is the
/// caller's job.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read one counter value
    async fn get_counter(&self, tenant: &TenantId, counter: &str) -> Result<Option<CounterValue>>;

    /// Upsert one counter value
    async fn put_counter(&self, tenant: &TenantId, counter: &str, value: CounterValue) -> Result<()>;

    /// Read every counter of a tenant
    async fn snapshot(&self, tenant: &TenantId) -> Result<CounterSnapshot>;

    /// Read the raw settings document
    async fn get_settings(&self, tenant: &TenantId) -> Result<Option<Value>>;

    /// Upsert the settings document
    async fn put_settings(&self, tenant: &TenantId, settings: Value) -> Result<()>;

    /// Delete everything stored for a tenant
    async fn remove_tenant(&self, tenant: &TenantId) -> Result<()>;
}

/// Open the store selected by configuration
///
/// # Errors
///
/// Returns an error when the database cannot be opened or the backend is not compiled in
pub async fn open_store(url: &StoreUrl) -> Result<Arc<dyn CounterStore>> {
    match url {
        StoreUrl::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreUrl::Sqlite { path } => Ok(Arc::new(SqliteStore::open(path).await?)),
        #[cfg(not(feature = "sqlite"))]
        StoreUrl::Sqlite { .. } => anyhow::bail!("built without the 'sqlite' feature"),
    }
}
