// ABOUTME: Integration tests for the memory and SQLite counter stores
// ABOUTME: Checks entry round trips, snapshots, settings documents, tenant removal, and persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tallyhub_core::models::CounterValue;
use tallyhub_server::config::StoreUrl;
use tallyhub_server::store::{open_store, CounterStore, MemoryStore, SqliteStore};

async fn exercise_store(store: &dyn CounterStore) {
    let alpha = common::tenant("alpha");
    let beta = common::tenant("beta");
    let earlier = Utc::now() - Duration::minutes(5);
    let later = Utc::now();

    assert!(store.get_counter(&alpha, "deaths").await.unwrap().is_none());
    assert!(store.get_settings(&alpha).await.unwrap().is_none());

    store
        .put_counter(&alpha, "deaths", CounterValue { value: 3, updated_at: earlier })
        .await
        .unwrap();
    store
        .put_counter(&alpha, "swears", CounterValue { value: 7, updated_at: later })
        .await
        .unwrap();
    store
        .put_counter(&beta, "deaths", CounterValue { value: 1, updated_at: earlier })
        .await
        .unwrap();
    store
        .put_settings(&alpha, json!({ "version": 1 }))
        .await
        .unwrap();

    assert_eq!(
        store.get_counter(&alpha, "deaths").await.unwrap().unwrap().value,
        3
    );

    let snapshot = store.snapshot(&alpha).await.unwrap();
    assert_eq!(snapshot.counters.len(), 2, "settings must not appear as a counter");
    assert_eq!(snapshot.value("swears"), 7);
    assert_eq!(snapshot.updated_at.unwrap().timestamp(), later.timestamp());

    store
        .put_counter(&alpha, "deaths", CounterValue { value: 4, updated_at: later })
        .await
        .unwrap();
    assert_eq!(store.snapshot(&alpha).await.unwrap().value("deaths"), 4);

    store.remove_tenant(&alpha).await.unwrap();
    assert!(store.snapshot(&alpha).await.unwrap().counters.is_empty());
    assert!(store.get_settings(&alpha).await.unwrap().is_none());
    assert_eq!(store.snapshot(&beta).await.unwrap().value("deaths"), 1);
}

#[tokio::test]
async fn test_memory_store_contract() {
    common::init_test_logging();
    let store = MemoryStore::new();
    exercise_store(&store).await;
    assert_eq!(store.tenant_count(), 1);
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("store.db")).await.unwrap();
    exercise_store(&store).await;
}

#[tokio::test]
async fn test_sqlite_survives_reopen() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let tenant = common::tenant("durable");

    {
        let store: Arc<dyn CounterStore> =
            open_store(&StoreUrl::Sqlite { path: path.clone() }).await.unwrap();
        store
            .put_counter(&tenant, "screams", CounterValue { value: 42, updated_at: Utc::now() })
            .await
            .unwrap();
        store
            .put_settings(&tenant, json!({ "discordWebhookUrl": common::DISCORD_WEBHOOK }))
            .await
            .unwrap();
    }

    let reopened = SqliteStore::open(&path).await.unwrap();
    assert_eq!(reopened.snapshot(&tenant).await.unwrap().value("screams"), 42);
    assert_eq!(
        reopened.get_settings(&tenant).await.unwrap().unwrap()["discordWebhookUrl"],
        common::DISCORD_WEBHOOK
    );
}

#[tokio::test]
async fn test_legacy_document_in_store_is_migrated_on_load() {
    common::init_test_logging();
    let store = MemoryStore::new();
    let tenant = common::tenant("legacy");
    store
        .put_settings(
            &tenant,
            json!({
                "discord_webhook_url": common::DISCORD_WEBHOOK,
                "template_style": "party",
                "custom_counters": { "jumps": { "name": "Jumps", "emoji": "🦘" } }
            }),
        )
        .await
        .unwrap();

    let settings = tallyhub_server::settings::load(&store, &tenant).await.unwrap();
    assert_eq!(
        settings.notifications.webhook_url.as_ref().unwrap().as_str(),
        common::DISCORD_WEBHOOK
    );
    let jumps = settings.counter("jumps").unwrap();
    assert_eq!(jumps.display_name, "Jumps");
    assert_eq!(jumps.icon, "🦘");
}
