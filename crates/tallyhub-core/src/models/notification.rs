// ABOUTME: Notification preferences, validated webhook destinations, and template styles
// ABOUTME: A webhook URL is validated once when configured and never again downstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::constants::{categories, webhook};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Discord webhook URL that passed provider-prefix validation
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebhookUrl(String);

impl WebhookUrl {
    /// Validate a webhook URL
    ///
    /// # Errors
    ///
    /// Returns `InvalidWebhookUrl` unless the URL parses and starts with an accepted
    /// provider prefix
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.len() > webhook::MAX_URL_LEN {
            return Err(AppError::invalid_webhook_url("webhook URL is too long"));
        }
        let parsed = url::Url::parse(trimmed)
            .map_err(|e| AppError::invalid_webhook_url(format!("malformed webhook URL: {e}")))?;
        let accepted = webhook::ACCEPTED_PREFIXES.iter().any(|prefix| {
            trimmed.starts_with(prefix) && trimmed.len() > prefix.len()
        });
        if !accepted || parsed.host_str().is_none() {
            return Err(AppError::invalid_webhook_url(
                "webhook URL must be a Discord webhook (https://discord.com/api/webhooks/...)",
            ));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The validated URL
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Webhook URLs embed a secret token, never print it in full.
impl fmt::Debug for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible = self.0.rsplit_once('/').map_or("", |(head, _)| head);
        write!(f, "WebhookUrl({visible}/***)")
    }
}

impl TryFrom<String> for WebhookUrl {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WebhookUrl> for String {
    fn from(url: WebhookUrl) -> Self {
        url.0
    }
}

/// Built-in embed template styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    /// Title, description, and value fields
    #[default]
    Classic,
    /// Single-line description
    Minimal,
    /// Party styling with image and link button
    Celebration,
}

impl TemplateStyle {
    /// Resolve a style name, falling back to the default style for unknown names
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "minimal" | "compact" => Self::Minimal,
            "celebration" | "party" | "hype" => Self::Celebration,
            _ => Self::Classic,
        }
    }
}

impl<'de> Deserialize<'de> for TemplateStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Per-tenant notification preferences
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Discord webhook destination; absent means the webhook channel is inactive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<WebhookUrl>,
    /// Embed template
    #[serde(default)]
    pub template_style: TemplateStyle,
    /// Public channel URL used for link buttons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_url: Option<String>,
    /// Image shown by the celebration template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebration_image_url: Option<String>,
    /// Explicit per-category flags
    #[serde(default)]
    pub categories: BTreeMap<String, bool>,
}

impl NotificationPreferences {
    /// Whether a category is enabled
    ///
    /// Milestone categories default to enabled, everything else to disabled.
    #[must_use]
    pub fn is_enabled(&self, category: &str) -> bool {
        self.categories
            .get(category)
            .copied()
            .unwrap_or_else(|| category.ends_with(categories::MILESTONE_SUFFIX))
    }

    /// Set a category flag
    pub fn set_enabled(&mut self, category: impl Into<String>, enabled: bool) {
        self.categories.insert(category.into(), enabled);
    }

    /// The webhook destination when the category is enabled and a URL is configured
    #[must_use]
    pub fn webhook_for(&self, category: &str) -> Option<&WebhookUrl> {
        self.webhook_url
            .as_ref()
            .filter(|_| self.is_enabled(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "https://discord.com/api/webhooks/123/abc-token";

    #[test]
    fn test_webhook_url_prefix() {
        assert!(WebhookUrl::parse(VALID).is_ok());
        assert!(WebhookUrl::parse("https://discordapp.com/api/webhooks/1/x").is_ok());
        let err = WebhookUrl::parse("https://evil.example/x").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidWebhookUrl);
        assert!(WebhookUrl::parse("https://discord.com/api/webhooks/").is_err());
        assert!(WebhookUrl::parse("http://discord.com/api/webhooks/1/x").is_err());
        assert!(WebhookUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_webhook_url_debug_hides_token() {
        let url = WebhookUrl::parse(VALID).unwrap();
        assert!(!format!("{url:?}").contains("abc-token"));
    }

    #[test]
    fn test_template_style_fallback() {
        assert_eq!(TemplateStyle::from_name("MINIMAL"), TemplateStyle::Minimal);
        assert_eq!(TemplateStyle::from_name("sparkles"), TemplateStyle::Classic);
        let style: TemplateStyle = serde_json::from_str("\"neon\"").unwrap();
        assert_eq!(style, TemplateStyle::Classic);
    }

    #[test]
    fn test_category_defaults() {
        let mut prefs = NotificationPreferences::default();
        assert!(prefs.is_enabled("deaths_milestone"));
        assert!(!prefs.is_enabled("stream_online"));
        assert!(prefs.webhook_for("deaths_milestone").is_none());

        prefs.webhook_url = Some(WebhookUrl::parse(VALID).unwrap());
        assert!(prefs.webhook_for("deaths_milestone").is_some());
        prefs.set_enabled("deaths_milestone", false);
        assert!(prefs.webhook_for("deaths_milestone").is_none());
    }
}
