// ABOUTME: Mutation engine applying signed deltas to counters with per-key FIFO serialization
// ABOUTME: Persists every change before reporting it and detects crossed milestones on increments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Mutation Engine
//!
//! At most one mutation per `(tenant, counter)` runs at a time. Each key owns a fair
//! `tokio::sync::Mutex`, so waiting mutations are applied in arrival order while
//! different keys (including other counters of the same tenant) proceed in parallel.
//! A read-modify-write cycle happens entirely under the key lock, and the new value is
//! persisted before the outcome is returned.

use super::milestones;
use crate::errors::{AppError, AppResult};
use crate::logging::TenantLogger;
use crate::settings;
use crate::store::CounterStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tallyhub_core::models::{CounterSnapshot, CounterValue, TenantId, TenantSettings};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Requested change to a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Add a signed amount, flooring the result at zero
    Delta(i64),
    /// Set the counter to zero
    Reset,
}

/// Classification of an applied mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Non-negative delta
    Increment,
    /// Negative delta
    Decrement,
    /// Reset to zero
    Reset,
}

impl From<Mutation> for MutationKind {
    fn from(mutation: Mutation) -> Self {
        match mutation {
            Mutation::Delta(delta) if delta >= 0 => Self::Increment,
            Mutation::Delta(_) => Self::Decrement,
            Mutation::Reset => Self::Reset,
        }
    }
}

/// Result of an applied mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Counter key
    pub counter: String,
    /// Kind of mutation
    pub kind: MutationKind,
    /// Value before the mutation
    pub previous: u64,
    /// Value after the mutation
    pub value: u64,
    /// `value - previous`
    pub change: i64,
    /// Thresholds crossed by this mutation, ascending
    pub crossed: Vec<u64>,
    /// When the new value was written
    pub updated_at: DateTime<Utc>,
}

type CounterKey = (TenantId, String);

/// Serialized counter mutations over a [`CounterStore`]
pub struct MutationEngine {
    store: Arc<dyn CounterStore>,
    locks: DashMap<CounterKey, Arc<Mutex<()>>>,
}

impl MutationEngine {
    /// Create an engine over a store
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Apply a mutation, reading the tenant's settings fresh
    ///
    /// # Errors
    ///
    /// Returns `InvalidCounter` for unknown counters and `PersistenceFailure` when the
    /// store read or write fails
    pub async fn mutate(
        &self,
        tenant: &TenantId,
        counter: &str,
        mutation: Mutation,
    ) -> AppResult<MutationOutcome> {
        let settings = settings::load(self.store.as_ref(), tenant).await?;
        self.mutate_with(tenant, &settings, counter, mutation).await
    }

    /// Add the counter's increment step
    ///
    /// # Errors
    ///
    /// See [`MutationEngine::mutate`]
    pub async fn increment(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        let settings = settings::load(self.store.as_ref(), tenant).await?;
        let mutation = resolve_mutation(&settings, counter, MutationKind::Increment)
            .map_err(|e| e.with_tenant(tenant.as_str()))?;
        self.mutate_with(tenant, &settings, counter, mutation).await
    }

    /// Subtract the counter's decrement step
    ///
    /// # Errors
    ///
    /// See [`MutationEngine::mutate`]
    pub async fn decrement(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        let settings = settings::load(self.store.as_ref(), tenant).await?;
        let mutation = resolve_mutation(&settings, counter, MutationKind::Decrement)
            .map_err(|e| e.with_tenant(tenant.as_str()))?;
        self.mutate_with(tenant, &settings, counter, mutation).await
    }

    /// Reset the counter to zero
    ///
    /// # Errors
    ///
    /// See [`MutationEngine::mutate`]
    pub async fn reset(&self, tenant: &TenantId, counter: &str) -> AppResult<MutationOutcome> {
        self.mutate(tenant, counter, Mutation::Reset).await
    }

    /// Apply a mutation using already-loaded settings
    ///
    /// # Errors
    ///
    /// See [`MutationEngine::mutate`]
    pub async fn mutate_with(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
        counter: &str,
        mutation: Mutation,
    ) -> AppResult<MutationOutcome> {
        self.mutate_then(tenant, settings, counter, mutation, |_| {})
            .await
    }

    /// Apply a mutation and run `on_applied` before the key lock is released
    ///
    /// Anything `on_applied` emits is ordered exactly like the mutations of that
    /// counter. It must not block; it runs only when the new value was persisted.
    ///
    /// # Errors
    ///
    /// See [`MutationEngine::mutate`]
    pub async fn mutate_then<F>(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
        counter: &str,
        mutation: Mutation,
        on_applied: F,
    ) -> AppResult<MutationOutcome>
    where
        F: FnOnce(&MutationOutcome) + Send,
    {
        if settings.counter(counter).is_none() {
            return Err(AppError::invalid_counter(counter).with_tenant(tenant.as_str()));
        }

        let _guard = self.acquire(tenant, counter).await;

        let previous = self
            .store
            .get_counter(tenant, counter)
            .await
            .map_err(|e| persistence_error(tenant, counter, &e))?
            .map_or(0, |stored| stored.value);

        let value = match mutation {
            Mutation::Delta(delta) if delta >= 0 => previous.saturating_add(delta.unsigned_abs()),
            Mutation::Delta(delta) => previous.saturating_sub(delta.unsigned_abs()),
            Mutation::Reset => 0,
        };
        let updated_at = Utc::now();

        self.store
            .put_counter(tenant, counter, CounterValue { value, updated_at })
            .await
            .map_err(|e| persistence_error(tenant, counter, &e))?;

        let kind = MutationKind::from(mutation);
        let crossed = match kind {
            MutationKind::Increment => {
                milestones::detect(previous, value, settings.milestones.for_counter(counter))
            }
            MutationKind::Decrement | MutationKind::Reset => Vec::new(),
        };

        TenantLogger::log_mutation(tenant.as_str(), counter, previous, value, &crossed);

        let outcome = MutationOutcome {
            tenant_id: tenant.clone(),
            counter: counter.to_owned(),
            kind,
            previous,
            value,
            change: signed_change(previous, value),
            crossed,
            updated_at,
        };
        on_applied(&outcome);
        Ok(outcome)
    }

    /// Every counter of a tenant
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store read fails
    pub async fn snapshot(&self, tenant: &TenantId) -> AppResult<CounterSnapshot> {
        self.store.snapshot(tenant).await.map_err(|e| {
            AppError::persistence(format!("failed to read counters: {e:#}"))
                .with_tenant(tenant.as_str())
        })
    }

    /// Current value of one counter
    ///
    /// # Errors
    ///
    /// Returns `InvalidCounter` for unknown counters and `PersistenceFailure` if the
    /// store read fails
    pub async fn query(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
        counter: &str,
    ) -> AppResult<u64> {
        if settings.counter(counter).is_none() {
            return Err(AppError::invalid_counter(counter).with_tenant(tenant.as_str()));
        }
        Ok(self
            .store
            .get_counter(tenant, counter)
            .await
            .map_err(|e| persistence_error(tenant, counter, &e))?
            .map_or(0, |stored| stored.value))
    }

    /// Delete every counter of a tenant once its in-flight mutations have finished
    ///
    /// All of the tenant's key locks are held while the store delete runs, so no write
    /// lands after it. Mutations queued behind those locks retry on fresh ones.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the store delete fails
    pub async fn remove_tenant(&self, tenant: &TenantId) -> AppResult<()> {
        let mut locks: Vec<(String, Arc<Mutex<()>>)> = self
            .locks
            .iter()
            .filter(|entry| &entry.key().0 == tenant)
            .map(|entry| (entry.key().1.clone(), Arc::clone(entry.value())))
            .collect();
        // Key order, so concurrent removals of one tenant never deadlock
        locks.sort_by(|a, b| a.0.cmp(&b.0));

        let mut guards = Vec::with_capacity(locks.len());
        for (_, lock) in locks {
            guards.push(lock.lock_owned().await);
        }

        let removed = self.store.remove_tenant(tenant).await.map_err(|e| {
            AppError::persistence(format!("failed to remove tenant: {e:#}"))
                .with_tenant(tenant.as_str())
        });
        self.locks.retain(|(owner, _), _| owner != tenant);
        drop(guards);
        removed
    }

    /// Lock a key, retrying when the lock was retired while waiting
    async fn acquire(&self, tenant: &TenantId, counter: &str) -> OwnedMutexGuard<()> {
        let key = (tenant.clone(), counter.to_owned());
        loop {
            let lock = self.locks.entry(key.clone()).or_default().clone();
            let guard = Arc::clone(&lock).lock_owned().await;
            let current = self
                .locks
                .get(&key)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &lock));
            if current {
                return guard;
            }
        }
    }
}

/// The concrete mutation for a kind, using the counter's configured step sizes
///
/// # Errors
///
/// Returns `InvalidCounter` when the counter is not defined for the tenant
pub fn resolve_mutation(
    settings: &TenantSettings,
    counter: &str,
    kind: MutationKind,
) -> AppResult<Mutation> {
    let definition = settings
        .counter(counter)
        .ok_or_else(|| AppError::invalid_counter(counter))?;
    let step = |amount: u64| i64::try_from(amount).unwrap_or(i64::MAX);
    Ok(match kind {
        MutationKind::Increment => Mutation::Delta(step(definition.increment_by)),
        MutationKind::Decrement => Mutation::Delta(-step(definition.decrement_by)),
        MutationKind::Reset => Mutation::Reset,
    })
}

fn signed_change(previous: u64, value: u64) -> i64 {
    if value >= previous {
        i64::try_from(value - previous).unwrap_or(i64::MAX)
    } else {
        i64::try_from(previous - value).map_or(i64::MIN, |drop| -drop)
    }
}

fn persistence_error(tenant: &TenantId, counter: &str, error: &anyhow::Error) -> AppError {
    AppError::persistence(format!("failed to persist counter '{counter}': {error:#}"))
        .with_tenant(tenant.as_str())
}
