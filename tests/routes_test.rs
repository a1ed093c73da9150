// ABOUTME: HTTP route tests serving the full router on an ephemeral port
// ABOUTME: Covers triggers, snapshots, settings migration, validation errors, stream, and bot control
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{ConnectStep, RecordingSink, ScriptedTransport};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let response = client.post(url).json(&body).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tallyhub-server");
}

#[tokio::test]
async fn test_trigger_routes() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api/tenants/1234/counters");

    let (status, body) = post_json(&client, format!("{base}/deaths/increment"), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "value": 1, "change": 1 }));

    post_json(&client, format!("{base}/deaths/increment"), Value::Null).await;
    let (_, body) = post_json(&client, format!("{base}/deaths/decrement"), Value::Null).await;
    assert_eq!(body, json!({ "value": 1, "change": -1 }));

    let (_, body) = post_json(&client, format!("{base}/swears/decrement"), Value::Null).await;
    assert_eq!(body, json!({ "value": 0, "change": 0 }));

    let (_, body) = post_json(&client, format!("{base}/deaths/reset"), Value::Null).await;
    assert_eq!(body, json!({ "value": 0, "change": -1 }));

    post_json(&client, format!("{base}/screams/increment"), Value::Null).await;
    let snapshot: Value = client.get(base).send().await.unwrap().json().await.unwrap();
    assert_eq!(snapshot["tenant_id"], "1234");
    assert_eq!(snapshot["counters"]["screams"], 1);
    assert_eq!(snapshot["counters"]["deaths"], 0);
    assert_eq!(snapshot["counters"]["swears"], 0);
}

#[tokio::test]
async fn test_validation_errors() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/tenants/1234/counters/jumps/increment"),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_COUNTER");

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/tenants/bad%20id/counters/deaths/increment"),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let response = client
        .put(format!("http://{addr}/api/tenants/1234/settings"))
        .json(&json!({ "version": 1, "notifications": { "webhook_url": "https://evil.example/x" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_WEBHOOK_URL");

    let response = client
        .put(format!("http://{addr}/api/tenants/1234/settings"))
        .json(&json!({ "discordWebhookUrl": "https://evil.example/x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let settings = resources
        .counters
        .settings(&common::tenant("1234"))
        .await
        .unwrap();
    assert!(settings.notifications.webhook_url.is_none());
}

#[tokio::test]
async fn test_settings_legacy_blob_is_migrated() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/tenants/legacy/settings");

    let response = client
        .put(&url)
        .json(&json!({
            "discordWebhookUrl": common::DISCORD_WEBHOOK,
            "templateStyle": "minimal",
            "customCounters": { "Jumps": { "name": "Jumps", "incrementBy": 2 } },
            "milestones": { "deathMilestones": [5, 15] },
            "chatBot": { "allowVips": true }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored["version"], 1);
    assert_eq!(stored["notifications"]["webhook_url"], common::DISCORD_WEBHOOK);
    assert_eq!(stored["notifications"]["template_style"], "minimal");
    assert_eq!(stored["custom_counters"][0]["key"], "jumps");
    assert_eq!(stored["custom_counters"][0]["increment_by"], 2);
    assert_eq!(stored["milestones"]["deaths"], json!([5, 15]));
    assert_eq!(stored["bot"]["allow_vips"], true);

    let (_, body) = post_json(
        &client,
        format!("http://{addr}/api/tenants/legacy/counters/jumps/increment"),
        Value::Null,
    )
    .await;
    assert_eq!(body, json!({ "value": 2, "change": 2 }));
}

#[tokio::test]
async fn test_stream_route_reports_changes() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/tenants/caster/stream");

    let (status, body) = post_json(&client, url.clone(), json!({ "live": true, "title": "hi" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "live": true, "changed": true }));

    let (_, body) = post_json(&client, url, json!({ "live": true })).await;
    assert_eq!(body, json!({ "live": true, "changed": false }));
}

#[tokio::test]
async fn test_bot_enable_and_disable_routes() {
    let transport = ScriptedTransport::new([ConnectStep::Accept]);
    let resources = common::create_test_resources(RecordingSink::new(), transport.clone());
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api/tenants/botty/bot");

    let (status, _) = post_json(
        &client,
        format!("{base}/enable"),
        json!({ "login": "", "oauth_token": "x", "channel": "botty" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &client,
        format!("{base}/enable"),
        json!({ "login": "tallybot", "oauth_token": "oauth:abc", "channel": "botty" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["tenantId"], "botty");

    let _channel = transport.next_channel().await;
    let mut state = Value::Null;
    for _ in 0..50 {
        state = client.get(&base).send().await.unwrap().json().await.unwrap();
        if state["state"] == "connected" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(state["state"], "connected");
    assert_eq!(state["enabled"], true);

    let (status, body) = post_json(&client, format!("{base}/disable"), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "disabled");
    assert_eq!(body["enabled"], false);

    let settings = resources
        .counters
        .settings(&common::tenant("botty"))
        .await
        .unwrap();
    assert!(!settings.bot.enabled);
}

#[tokio::test]
async fn test_delete_tenant_removes_state() {
    let resources = common::create_offline_resources();
    let addr = common::spawn_server(&resources).await;
    let client = reqwest::Client::new();

    post_json(
        &client,
        format!("http://{addr}/api/tenants/gone/counters/deaths/increment"),
        Value::Null,
    )
    .await;
    let response = client
        .delete(format!("http://{addr}/api/tenants/gone"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let snapshot = resources.counters.snapshot(&common::tenant("gone")).await.unwrap();
    assert_eq!(snapshot.value("deaths"), 0);
    assert!(snapshot.updated_at.is_none());
}
