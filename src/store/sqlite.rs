// ABOUTME: SQLite-backed Counter Store using a single key-value entry table
// ABOUTME: Each (tenant, context key) pair is one row, written with an upsert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::{counter_key, CounterStore, COUNTER_KEY_PREFIX, SETTINGS_KEY};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use tallyhub_core::models::{CounterSnapshot, CounterValue, TenantId};

/// SQLite [`CounterStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file and run migrations
    pub async fn open(path: &Path) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        Self::connect(&url).await
    }

    /// Connect to a database URL and run migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed to connect to {database_url}"))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create the entry table
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenant_entries (
                tenant_id TEXT NOT NULL,
                entry_key TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (tenant_id, entry_key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_entry(&self, tenant: &TenantId, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT payload FROM tenant_entries WHERE tenant_id = ? AND entry_key = ?",
        )
        .bind(tenant.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let payload: String = row.try_get("payload")?;
            serde_json::from_str(&payload)
                .with_context(|| format!("corrupt entry '{key}' for tenant {tenant}"))
        })
        .transpose()
    }

    async fn put_entry(&self, tenant: &TenantId, key: &str, payload: &Value) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO tenant_entries (tenant_id, entry_key, payload, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (tenant_id, entry_key)
            DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            ",
        )
        .bind(tenant.as_str())
        .bind(key)
        .bind(payload.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for SqliteStore {
    async fn get_counter(&self, tenant: &TenantId, counter: &str) -> Result<Option<CounterValue>> {
        self.get_entry(tenant, &counter_key(counter))
            .await?
            .map(|value| serde_json::from_value(value).context("corrupt counter entry"))
            .transpose()
    }

    async fn put_counter(&self, tenant: &TenantId, counter: &str, value: CounterValue) -> Result<()> {
        self.put_entry(tenant, &counter_key(counter), &serde_json::to_value(value)?)
            .await
    }

    async fn snapshot(&self, tenant: &TenantId) -> Result<CounterSnapshot> {
        let rows = sqlx::query(
            "SELECT entry_key, payload FROM tenant_entries WHERE tenant_id = ? AND entry_key LIKE ?",
        )
        .bind(tenant.as_str())
        .bind(format!("{COUNTER_KEY_PREFIX}%"))
        .fetch_all(&self.pool)
        .await?;

        let mut snapshot = CounterSnapshot::empty(tenant.clone());
        for row in rows {
            let key: String = row.try_get("entry_key")?;
            let payload: String = row.try_get("payload")?;
            let Some(counter) = key.strip_prefix(COUNTER_KEY_PREFIX) else {
                continue;
            };
            let value: CounterValue = serde_json::from_str(&payload)
                .with_context(|| format!("corrupt counter entry '{key}'"))?;
            snapshot.record(counter, value);
        }
        Ok(snapshot)
    }

    async fn get_settings(&self, tenant: &TenantId) -> Result<Option<Value>> {
        self.get_entry(tenant, SETTINGS_KEY).await
    }

    async fn put_settings(&self, tenant: &TenantId, settings: Value) -> Result<()> {
        self.put_entry(tenant, SETTINGS_KEY, &settings).await
    }

    async fn remove_tenant(&self, tenant: &TenantId) -> Result<()> {
        sqlx::query("DELETE FROM tenant_entries WHERE tenant_id = ?")
            .bind(tenant.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
