// ABOUTME: Process-local Counter Store backed by a sharded concurrent map
// ABOUTME: Used for development, tests, and single-node deployments without persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::CounterStore;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use tallyhub_core::models::{CounterSnapshot, CounterValue, TenantId};

#[derive(Debug, Default)]
struct TenantEntries {
    counters: HashMap<String, CounterValue>,
    settings: Option<Value>,
}

/// In-memory [`CounterStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: DashMap<TenantId, TenantEntries>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tenants with stored data
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get_counter(&self, tenant: &TenantId, counter: &str) -> Result<Option<CounterValue>> {
        Ok(self
            .tenants
            .get(tenant)
            .and_then(|entries| entries.counters.get(counter).copied()))
    }

    async fn put_counter(&self, tenant: &TenantId, counter: &str, value: CounterValue) -> Result<()> {
        self.tenants
            .entry(tenant.clone())
            .or_default()
            .counters
            .insert(counter.to_owned(), value);
        Ok(())
    }

    async fn snapshot(&self, tenant: &TenantId) -> Result<CounterSnapshot> {
        let mut snapshot = CounterSnapshot::empty(tenant.clone());
        if let Some(entries) = self.tenants.get(tenant) {
            for (key, value) in &entries.counters {
                snapshot.record(key.clone(), *value);
            }
        }
        Ok(snapshot)
    }

    async fn get_settings(&self, tenant: &TenantId) -> Result<Option<Value>> {
        Ok(self
            .tenants
            .get(tenant)
            .and_then(|entries| entries.settings.clone()))
    }

    async fn put_settings(&self, tenant: &TenantId, settings: Value) -> Result<()> {
        self.tenants.entry(tenant.clone()).or_default().settings = Some(settings);
        Ok(())
    }

    async fn remove_tenant(&self, tenant: &TenantId) -> Result<()> {
        self.tenants.remove(tenant);
        Ok(())
    }
}
