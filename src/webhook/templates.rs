// ABOUTME: Renders notification payloads into Discord webhook messages
// ABOUTME: Supports classic, minimal, and celebration embed styles plus a channel link button
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::notifications::{NotificationKind, NotificationPayload};
use serde::{Deserialize, Serialize};
use tallyhub_core::constants::webhook;
use tallyhub_core::models::TemplateStyle;

/// Discord webhook execute body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordMessage {
    /// Sender name shown in the channel
    pub username: String,
    /// Rich embeds
    pub embeds: Vec<Embed>,
    /// Message components (link buttons)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

/// One Discord embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title
    pub title: String,
    /// Embed body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sidebar color
    pub color: u32,
    /// Name/value fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// Large image below the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Embed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    /// Image URL
    pub url: String,
}

/// Embed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label
    pub name: String,
    /// Field value
    pub value: String,
    /// Render side by side
    pub inline: bool,
}

/// Row of components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    /// Always 1 (action row)
    #[serde(rename = "type")]
    pub kind: u8,
    /// Buttons in the row
    pub components: Vec<LinkButton>,
}

/// Link button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    /// Always 2 (button)
    #[serde(rename = "type")]
    pub kind: u8,
    /// Always 5 (link style)
    pub style: u8,
    /// Button text
    pub label: String,
    /// Target URL
    pub url: String,
}

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const LINK_STYLE: u8 = 5;

fn field(name: &str, value: impl ToString) -> EmbedField {
    EmbedField {
        name: name.to_owned(),
        value: value.to_string(),
        inline: true,
    }
}

/// Render a payload in the given style
#[must_use]
pub fn render(
    payload: &NotificationPayload,
    style: TemplateStyle,
    channel_url: Option<&str>,
    image_url: Option<&str>,
) -> DiscordMessage {
    let name = payload
        .display_name
        .as_deref()
        .or(payload.counter.as_deref())
        .unwrap_or("Counter");
    let icon = payload.icon.as_deref().unwrap_or("🔢");
    let value = payload.value.unwrap_or(0);
    let timestamp = payload.occurred_at.to_rfc3339();

    let embed = match payload.kind {
        NotificationKind::MilestoneReached => {
            let threshold = payload.threshold.unwrap_or(value);
            match style {
                TemplateStyle::Classic => Embed {
                    title: format!("{icon} {name} Milestone!"),
                    description: Some(format!("{name} just reached **{threshold}**!")),
                    color: webhook::COLOR_CLASSIC,
                    fields: vec![
                        field("Counter", name),
                        field("Milestone", threshold),
                        field("Current", value),
                    ],
                    image: None,
                    timestamp,
                },
                TemplateStyle::Minimal => Embed {
                    title: format!("{icon} {name}: {threshold}"),
                    description: None,
                    color: webhook::COLOR_MINIMAL,
                    fields: Vec::new(),
                    image: None,
                    timestamp,
                },
                TemplateStyle::Celebration => Embed {
                    title: format!("🎉 {name} milestone unlocked! 🎉"),
                    description: Some(format!(
                        "{icon} **{threshold}** {name} and counting! Chat, make some noise!"
                    )),
                    color: webhook::COLOR_CELEBRATION,
                    fields: vec![field("Milestone", threshold)],
                    image: image_url.map(|url| EmbedImage {
                        url: url.to_owned(),
                    }),
                    timestamp,
                },
            }
        }
        NotificationKind::StreamOnline | NotificationKind::StreamOffline => {
            let live = payload.kind == NotificationKind::StreamOnline;
            let title = payload.stream.as_ref().and_then(|s| s.title.clone());
            Embed {
                title: if live {
                    format!("🔴 {} is live!", payload.tenant_id)
                } else {
                    format!("{} has gone offline", payload.tenant_id)
                },
                description: title.or_else(|| {
                    Some(if live { "Stream started" } else { "Stream ended" }.to_owned())
                }),
                color: if live {
                    webhook::COLOR_LIVE
                } else {
                    webhook::COLOR_OFFLINE
                },
                fields: Vec::new(),
                image: None,
                timestamp,
            }
        }
        NotificationKind::CounterUpdate => Embed {
            title: format!("{icon} {name}"),
            description: Some(format!("{name} is now **{value}**")),
            color: webhook::COLOR_MINIMAL,
            fields: Vec::new(),
            image: None,
            timestamp,
        },
    };

    let components = channel_url
        .map(|url| {
            vec![ActionRow {
                kind: ACTION_ROW,
                components: vec![LinkButton {
                    kind: BUTTON,
                    style: LINK_STYLE,
                    label: "Watch stream".to_owned(),
                    url: url.to_owned(),
                }],
            }]
        })
        .unwrap_or_default();

    DiscordMessage {
        username: webhook::DEFAULT_USERNAME.to_owned(),
        embeds: vec![embed],
        components,
    }
}
