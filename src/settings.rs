// ABOUTME: Tenant settings boundary: migration of stored documents into TenantSettings v1
// ABOUTME: Accepts the current document or the legacy JSON blob with its dual key variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # Tenant Settings
//!
//! Stored settings documents come in two shapes. Current documents carry a `version`
//! field and deserialize directly into [`TenantSettings`]. Legacy (version 0) blobs were
//! written by older clients that mixed camelCase and `snake_case` keys; [`migrate`] is the
//! only place that understands them. Everything past this module works with a fully
//! populated [`TenantSettings`].

use crate::errors::{AppError, AppResult};
use crate::store::CounterStore;
use serde_json::{Map, Value};
use tallyhub_core::constants::categories;
use tallyhub_core::models::{
    CounterDefinition, CustomCounter, TemplateStyle, TenantId, TenantSettings, Thresholds,
    WebhookUrl, SETTINGS_VERSION,
};
use tracing::warn;

/// Convert a stored settings document into current settings
///
/// # Errors
///
/// Returns `InvalidInput` when a versioned document does not match the schema, has an
/// unsupported version, or fails validation. Returns `InvalidWebhookUrl` when a
/// versioned document carries a bad webhook URL. Legacy blobs never fail; unusable
/// legacy entries are dropped with a warning.
pub fn migrate(raw: Value) -> AppResult<TenantSettings> {
    let Value::Object(object) = raw else {
        return match raw {
            Value::Null => Ok(TenantSettings::default()),
            _ => Err(AppError::invalid_input("settings must be a JSON object")),
        };
    };

    match object.get("version").and_then(Value::as_u64) {
        Some(version) if version > u64::from(SETTINGS_VERSION) => Err(AppError::invalid_input(
            format!("unsupported settings version {version}"),
        )),
        Some(version) if version >= 1 => {
            // Surface a bad webhook URL with its own error code rather than a schema error
            if let Some(raw_url) = object
                .get("notifications")
                .and_then(|notifications| notifications.get("webhook_url"))
                .and_then(Value::as_str)
            {
                WebhookUrl::parse(raw_url)?;
            }
            let settings: TenantSettings = serde_json::from_value(Value::Object(object))
                .map_err(|e| AppError::invalid_input(format!("invalid settings document: {e}")))?;
            settings.validate()?;
            Ok(settings)
        }
        _ => Ok(migrate_legacy(&object)),
    }
}

/// Convert a document submitted by a client
///
/// Same as [`migrate`], except that a bad webhook URL in a legacy blob is rejected
/// instead of dropped, so a client never stores settings that silently lost their
/// destination.
///
/// # Errors
///
/// See [`migrate`]
pub fn migrate_submitted(raw: Value) -> AppResult<TenantSettings> {
    if let Value::Object(object) = &raw {
        if let Some(raw_url) = pick_str(object, LEGACY_WEBHOOK_KEYS) {
            WebhookUrl::parse(raw_url)?;
        }
    }
    migrate(raw)
}

/// Load a tenant's settings, defaulting when none are stored
///
/// # Errors
///
/// Returns `PersistenceFailure` if the store read fails, or the [`migrate`] error for an
/// unreadable document
pub async fn load(store: &dyn CounterStore, tenant: &TenantId) -> AppResult<TenantSettings> {
    let raw = store.get_settings(tenant).await.map_err(|e| {
        AppError::persistence(format!("failed to read settings: {e:#}")).with_tenant(tenant.as_str())
    })?;
    raw.map_or_else(|| Ok(TenantSettings::default()), migrate)
}

/// Validate and persist a tenant's settings
///
/// # Errors
///
/// Returns `InvalidInput` for invalid settings or `PersistenceFailure` if the write fails
pub async fn save(
    store: &dyn CounterStore,
    tenant: &TenantId,
    settings: &TenantSettings,
) -> AppResult<()> {
    settings.validate()?;
    let mut document = serde_json::to_value(settings)?;
    if let Value::Object(object) = &mut document {
        object.insert("version".to_owned(), Value::from(SETTINGS_VERSION));
    }
    store.put_settings(tenant, document).await.map_err(|e| {
        AppError::persistence(format!("failed to write settings: {e:#}")).with_tenant(tenant.as_str())
    })
}

const LEGACY_WEBHOOK_KEYS: &[&str] = &["discordWebhookUrl", "discord_webhook_url", "webhookUrl"];

/// First present, non-null value among the key variants
fn pick<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn pick_u64(object: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    pick(object, keys).and_then(|value| match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn pick_bool(object: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    pick(object, keys).and_then(Value::as_bool)
}

fn pick_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    pick(object, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Legacy threshold lists hold numbers or numeric strings
fn legacy_thresholds(value: &Value) -> Option<Thresholds> {
    let items = value.as_array()?;
    Some(Thresholds::lenient(items.iter().filter_map(|item| match item {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })))
}

fn snake_to_camel(snake: &str) -> String {
    let mut camel = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            camel.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            camel.push(c);
        }
    }
    camel
}

/// Key variants under which a per-counter legacy entry may appear
fn counter_key_variants(counter: &CounterDefinition, suffix: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(4);
    for name in [counter.stem(), counter.key.as_str()] {
        variants.push(format!("{}{}", snake_to_camel(name), capitalize(suffix)));
        variants.push(format!("{name}_{suffix}"));
    }
    variants.dedup();
    variants
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + chars.as_str()
    })
}

fn legacy_custom_counter(key: &str, value: &Value) -> AppResult<(CustomCounter, Option<Thresholds>)> {
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);
    let custom = CustomCounter {
        key: key.to_ascii_lowercase(),
        display_name: pick_str(object, &["name", "displayName", "display_name"])
            .unwrap_or(key)
            .to_owned(),
        icon: pick_str(object, &["icon", "emoji"]).map(str::to_owned),
        increment_by: pick_u64(object, &["incrementBy", "increment_by"]).unwrap_or(1),
        decrement_by: pick_u64(object, &["decrementBy", "decrement_by"]).unwrap_or(1),
        alias: pick_str(object, &["alias", "chatAlias", "chat_alias"]).map(str::to_ascii_lowercase),
    };
    custom.validate()?;
    let thresholds = pick(object, &["milestones"]).and_then(legacy_thresholds);
    Ok((custom, thresholds))
}

fn migrate_legacy(object: &Map<String, Value>) -> TenantSettings {
    let mut settings = TenantSettings::default();

    if let Some(Value::Object(customs)) = pick(object, &["customCounters", "custom_counters"]) {
        for (key, value) in customs {
            match legacy_custom_counter(key, value) {
                Ok((custom, thresholds)) => {
                    if settings.counter(&custom.key).is_some() {
                        warn!(counter = %custom.key, "Skipping duplicate legacy custom counter");
                        continue;
                    }
                    if let Some(thresholds) = thresholds {
                        settings.milestones.set(custom.key.clone(), thresholds);
                    }
                    settings.custom_counters.push(custom);
                }
                Err(e) => warn!(counter = %key, error = %e, "Skipping invalid legacy custom counter"),
            }
        }
    }

    if let Some(Value::Object(milestones)) = pick(object, &["milestones", "milestoneThresholds"]) {
        for counter in settings.counters() {
            let mut keys = counter_key_variants(&counter, "milestones");
            keys.push(counter.key.clone());
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            if let Some(thresholds) = pick(milestones, &key_refs).and_then(legacy_thresholds) {
                settings.milestones.set(counter.key.clone(), thresholds);
            }
        }
    }

    let notifications = &mut settings.notifications;
    if let Some(raw_url) = pick_str(object, LEGACY_WEBHOOK_KEYS) {
        match WebhookUrl::parse(raw_url) {
            Ok(url) => notifications.webhook_url = Some(url),
            Err(e) => warn!(error = %e.message, "Dropping invalid legacy webhook URL"),
        }
    }
    if let Some(style) = pick_str(object, &["templateStyle", "template_style"]) {
        notifications.template_style = TemplateStyle::from_name(style);
    }
    notifications.channel_url = pick_str(object, &["channelUrl", "channel_url"]).map(str::to_owned);
    notifications.celebration_image_url =
        pick_str(object, &["celebrationImageUrl", "celebration_image_url", "celebrationImage"])
            .filter(|raw| url::Url::parse(raw).is_ok())
            .map(str::to_owned);

    if let Some(Value::Object(flags)) = pick(object, &["notificationSettings", "notification_settings"]) {
        let counters = settings.counters();
        let notifications = &mut settings.notifications;
        for counter in &counters {
            let keys = counter_key_variants(counter, "milestone");
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            if let Some(enabled) = pick_bool(flags, &key_refs) {
                notifications.set_enabled(counter.milestone_category(), enabled);
            }
        }
        if let Some(enabled) = pick_bool(flags, &["streamOnline", categories::STREAM_ONLINE]) {
            notifications.set_enabled(categories::STREAM_ONLINE, enabled);
        }
        if let Some(enabled) = pick_bool(flags, &["streamOffline", categories::STREAM_OFFLINE]) {
            notifications.set_enabled(categories::STREAM_OFFLINE, enabled);
        }
    }

    if let Some(Value::Object(bot)) = pick(object, &["chatBot", "bot"]) {
        let defaults = settings.bot.clone();
        settings.bot.enabled = pick_bool(bot, &["enabled"]).unwrap_or(defaults.enabled);
        settings.bot.announce_milestones = pick_bool(bot, &["announceMilestones", "announce_milestones"])
            .unwrap_or(defaults.announce_milestones);
        settings.bot.echo_mutations =
            pick_bool(bot, &["echoMutations", "echo_mutations"]).unwrap_or(defaults.echo_mutations);
        settings.bot.allow_vips =
            pick_bool(bot, &["allowVips", "allow_vips"]).unwrap_or(defaults.allow_vips);
    }

    settings.version = SETTINGS_VERSION;
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://discord.com/api/webhooks/1/token";

    #[test]
    fn test_null_document_is_default() {
        assert_eq!(migrate(Value::Null).unwrap(), TenantSettings::default());
    }

    #[test]
    fn test_submitted_legacy_webhook_is_strict() {
        let err = migrate_submitted(json!({ "discordWebhookUrl": "https://evil.example/x" }))
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidWebhookUrl);
        assert!(migrate(json!({ "discordWebhookUrl": "https://evil.example/x" })).is_ok());
    }

    #[test]
    fn test_camel_case_legacy_blob() {
        let settings = migrate(json!({
            "discordWebhookUrl": URL,
            "templateStyle": "party",
            "milestones": { "deathMilestones": [50, 10, 10, 0] },
            "notificationSettings": { "deathMilestone": false, "streamOnline": true },
            "chatBot": { "enabled": true }
        }))
        .unwrap();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.notifications.webhook_url.as_ref().unwrap().as_str(), URL);
        assert_eq!(settings.notifications.template_style, TemplateStyle::Celebration);
        assert_eq!(settings.milestones.for_counter("deaths"), &[10, 50]);
        assert_eq!(settings.milestones.for_counter("swears"), &[25, 50, 100, 250, 500, 1000]);
        assert!(!settings.notifications.is_enabled("deaths_milestone"));
        assert!(settings.notifications.is_enabled("swears_milestone"));
        assert!(settings.notifications.is_enabled("stream_online"));
        assert!(!settings.notifications.is_enabled("stream_offline"));
        assert!(settings.bot.enabled);
        assert!(settings.bot.announce_milestones);
    }

    #[test]
    fn test_snake_case_legacy_blob() {
        let settings = migrate(json!({
            "discord_webhook_url": URL,
            "template_style": "minimal",
            "milestoneThresholds": { "swear_milestones": [5] },
            "notification_settings": { "stream_offline": true },
            "custom_counters": {
                "jumps": { "name": "Jumps", "icon": "🦘", "increment_by": 2, "milestones": [3, 6] },
                "Bad Key": { "name": "nope" }
            },
            "bot": { "enabled": false, "allow_vips": true }
        }))
        .unwrap();

        assert_eq!(settings.notifications.template_style, TemplateStyle::Minimal);
        assert_eq!(settings.milestones.for_counter("swears"), &[5]);
        assert!(settings.notifications.is_enabled("stream_offline"));
        assert_eq!(settings.custom_counters.len(), 1);
        let jumps = settings.counter("jumps").unwrap();
        assert_eq!(jumps.increment_by, 2);
        assert_eq!(settings.milestones.for_counter("jumps"), &[3, 6]);
        assert!(settings.bot.allow_vips);
    }

    #[test]
    fn test_invalid_legacy_webhook_dropped() {
        let settings = migrate(json!({ "webhookUrl": "https://evil.example/x" })).unwrap();
        assert!(settings.notifications.webhook_url.is_none());
    }

    #[test]
    fn test_versioned_document_round_trip() {
        let mut settings = TenantSettings::default();
        settings.notifications.webhook_url = Some(WebhookUrl::parse(URL).unwrap());
        settings.bot.enabled = true;
        let document = serde_json::to_value(&settings).unwrap();
        assert_eq!(migrate(document).unwrap(), settings);
    }

    #[test]
    fn test_versioned_document_rejects_bad_webhook() {
        let err = migrate(json!({
            "version": 1,
            "notifications": { "webhook_url": "https://evil.example/x" }
        }))
        .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidWebhookUrl);
    }

    #[test]
    fn test_future_version_rejected() {
        assert!(migrate(json!({ "version": 99 })).is_err());
    }
}
