// ABOUTME: Notification router turning one event into a per-channel dispatch plan
// ABOUTME: Pure decision logic over tenant settings; no I/O happens here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::events::{NotificationEvent, NotificationPayload, RealtimeEvent};
use tallyhub_core::constants::categories;
use tallyhub_core::models::{CounterDefinition, TemplateStyle, TenantId, TenantSettings, WebhookUrl};

/// Where and how a webhook should be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    /// Validated destination
    pub url: WebhookUrl,
    /// Embed template
    pub style: TemplateStyle,
    /// Channel link for the embed button
    pub channel_url: Option<String>,
    /// Celebration template image
    pub image_url: Option<String>,
}

/// One downstream delivery of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchChannel {
    /// Push to overlay subscribers
    Realtime(RealtimeEvent),
    /// Post to the tenant's webhook
    Webhook(WebhookTarget),
    /// Reply in the tenant's chat
    ChatReply(String),
}

/// Channels one event fans out to
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Event content
    pub payload: NotificationPayload,
    /// Channels to deliver to
    pub channels: Vec<DispatchChannel>,
}

impl DispatchPlan {
    /// The webhook target, if the plan includes one
    #[must_use]
    pub fn webhook(&self) -> Option<&WebhookTarget> {
        self.channels.iter().find_map(|channel| match channel {
            DispatchChannel::Webhook(target) => Some(target),
            _ => None,
        })
    }

    /// The chat reply, if the plan includes one
    #[must_use]
    pub fn chat_reply(&self) -> Option<&str> {
        self.channels.iter().find_map(|channel| match channel {
            DispatchChannel::ChatReply(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The real-time event, if the plan includes one
    #[must_use]
    pub fn realtime(&self) -> Option<&RealtimeEvent> {
        self.channels.iter().find_map(|channel| match channel {
            DispatchChannel::Realtime(event) => Some(event),
            _ => None,
        })
    }
}

/// Decide which channels an event reaches
///
/// - counter updates go to overlays only
/// - milestones always reach overlays, the webhook when its category is enabled and a
///   URL is configured, and chat when the bot is enabled and announces milestones
/// - stream changes always reach overlays and the webhook when the matching stream
///   category is enabled
#[must_use]
pub fn route(
    tenant: &TenantId,
    event: &NotificationEvent,
    settings: &TenantSettings,
    display: Option<&CounterDefinition>,
) -> DispatchPlan {
    let payload = NotificationPayload::from_event(tenant, event, display);
    let mut channels = vec![DispatchChannel::Realtime(RealtimeEvent::from_payload(&payload))];

    let webhook_category = match event {
        NotificationEvent::MutationApplied(_) => None,
        NotificationEvent::MilestoneCrossed { outcome, .. } => Some(display.map_or_else(
            || format!("{}{}", outcome.counter, categories::MILESTONE_SUFFIX),
            CounterDefinition::milestone_category,
        )),
        NotificationEvent::StreamStateChanged(info) => Some(
            if info.live {
                categories::STREAM_ONLINE
            } else {
                categories::STREAM_OFFLINE
            }
            .to_owned(),
        ),
    };

    if let Some(url) = webhook_category
        .as_deref()
        .and_then(|category| settings.notifications.webhook_for(category))
    {
        channels.push(DispatchChannel::Webhook(WebhookTarget {
            url: url.clone(),
            style: settings.notifications.template_style,
            channel_url: settings.notifications.channel_url.clone(),
            image_url: settings.notifications.celebration_image_url.clone(),
        }));
    }

    if let NotificationEvent::MilestoneCrossed { outcome, threshold } = event {
        if settings.bot.enabled && settings.bot.announce_milestones {
            let (icon, name) = display.map_or(("🎉", outcome.counter.as_str()), |d| {
                (d.icon.as_str(), d.display_name.as_str())
            });
            channels.push(DispatchChannel::ChatReply(format!(
                "{icon} Milestone reached: {name} hit {threshold}!"
            )));
        }
    }

    DispatchPlan {
        tenant_id: tenant.clone(),
        payload,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{MutationKind, MutationOutcome};
    use crate::notifications::events::StreamInfo;
    use chrono::Utc;

    fn tenant() -> TenantId {
        TenantId::parse("t1").unwrap()
    }

    fn outcome(previous: u64, value: u64) -> MutationOutcome {
        MutationOutcome {
            tenant_id: tenant(),
            counter: "deaths".into(),
            kind: MutationKind::Increment,
            previous,
            value,
            change: 1,
            crossed: vec![10],
            updated_at: Utc::now(),
        }
    }

    fn settings_with_webhook() -> TenantSettings {
        let mut settings = TenantSettings::default();
        settings.notifications.webhook_url =
            Some(WebhookUrl::parse("https://discord.com/api/webhooks/1/abc").unwrap());
        settings
    }

    #[test]
    fn test_counter_update_is_realtime_only() {
        let settings = settings_with_webhook();
        let plan = route(
            &tenant(),
            &NotificationEvent::MutationApplied(outcome(1, 2)),
            &settings,
            None,
        );
        assert_eq!(plan.channels.len(), 1);
        assert_eq!(plan.realtime().unwrap().event_type, RealtimeEvent::COUNTER_UPDATE);
    }

    #[test]
    fn test_milestone_with_webhook_and_bot() {
        let mut settings = settings_with_webhook();
        settings.bot.enabled = true;
        let deaths = CounterDefinition::builtin("deaths").unwrap();
        let plan = route(
            &tenant(),
            &NotificationEvent::MilestoneCrossed {
                outcome: outcome(9, 10),
                threshold: 10,
            },
            &settings,
            Some(&deaths),
        );
        assert!(plan.webhook().is_some());
        assert_eq!(plan.chat_reply().unwrap(), "💀 Milestone reached: Deaths hit 10!");
        assert_eq!(plan.realtime().unwrap().threshold, Some(10));
    }

    #[test]
    fn test_milestone_category_disabled_skips_webhook() {
        let mut settings = settings_with_webhook();
        settings.notifications.set_enabled("deaths_milestone", false);
        let plan = route(
            &tenant(),
            &NotificationEvent::MilestoneCrossed {
                outcome: outcome(9, 10),
                threshold: 10,
            },
            &settings,
            CounterDefinition::builtin("deaths").as_ref(),
        );
        assert!(plan.webhook().is_none());
        assert!(plan.chat_reply().is_none());
        assert!(plan.realtime().is_some());
    }

    #[test]
    fn test_stream_online_respects_category() {
        let mut settings = settings_with_webhook();
        let event = NotificationEvent::StreamStateChanged(StreamInfo {
            live: true,
            title: Some("Elden Ring".into()),
        });
        assert!(route(&tenant(), &event, &settings, None).webhook().is_none());

        settings.notifications.set_enabled(categories::STREAM_ONLINE, true);
        let plan = route(&tenant(), &event, &settings, None);
        assert!(plan.webhook().is_some());
        assert_eq!(plan.realtime().unwrap().live, Some(true));
    }
}
