// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for counters, milestones, webhooks, and chat limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! Constants grouped by domain.

/// Built-in counters and their default milestone sets
pub mod counters {
    /// Deaths counter key
    pub const DEATHS: &str = "deaths";
    /// Swears counter key
    pub const SWEARS: &str = "swears";
    /// Screams counter key
    pub const SCREAMS: &str = "screams";

    /// Default death milestones used when a tenant has not configured any
    pub const DEFAULT_DEATH_MILESTONES: &[u64] = &[10, 25, 50, 100, 250, 500, 1000];
    /// Default swear milestones
    pub const DEFAULT_SWEAR_MILESTONES: &[u64] = &[25, 50, 100, 250, 500, 1000];
    /// Default scream milestones
    pub const DEFAULT_SCREAM_MILESTONES: &[u64] = &[10, 25, 50, 100, 250, 500];

    /// Maximum length of a custom counter key
    pub const MAX_COUNTER_NAME_LEN: usize = 32;
    /// Maximum number of custom counters per tenant
    pub const MAX_CUSTOM_COUNTERS: usize = 50;
    /// Icon used for custom counters that do not set one
    pub const DEFAULT_CUSTOM_ICON: &str = "🔢";
}

/// Notification preference categories
pub mod categories {
    /// Suffix appended to a counter key to form its milestone category
    pub const MILESTONE_SUFFIX: &str = "_milestone";
    /// Stream went live
    pub const STREAM_ONLINE: &str = "stream_online";
    /// Stream ended
    pub const STREAM_OFFLINE: &str = "stream_offline";
}

/// Discord webhook constants
pub mod webhook {
    /// Accepted webhook URL prefixes
    pub const ACCEPTED_PREFIXES: &[&str] = &[
        "https://discord.com/api/webhooks/",
        "https://discordapp.com/api/webhooks/",
    ];
    /// Maximum accepted webhook URL length
    pub const MAX_URL_LEN: usize = 512;
    /// Embed accent used by the classic style
    pub const COLOR_CLASSIC: u32 = 0x0091_46FF;
    /// Embed accent used by the minimal style
    pub const COLOR_MINIMAL: u32 = 0x002F_3136;
    /// Embed accent used by the celebration style
    pub const COLOR_CELEBRATION: u32 = 0x00FF_D700;
    /// Embed accent for stream online notices
    pub const COLOR_LIVE: u32 = 0x00E9_1916;
    /// Embed accent for stream offline notices
    pub const COLOR_OFFLINE: u32 = 0x0075_7575;
    /// Username shown on webhook posts
    pub const DEFAULT_USERNAME: &str = "TallyHub";
    /// Maximum response body bytes kept for diagnostics
    pub const MAX_DIAGNOSTIC_BODY_BYTES: usize = 2048;
}

/// Chat limits
pub mod chat {
    /// Command prefix for chat commands
    pub const COMMAND_PREFIX: char = '!';
    /// Twitch drops chat messages longer than this
    pub const MAX_MESSAGE_LEN: usize = 500;
}
