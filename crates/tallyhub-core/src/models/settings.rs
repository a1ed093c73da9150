// ABOUTME: Versioned, explicitly-typed tenant settings with documented defaults
// ABOUTME: Resolves counter definitions for a tenant from built-ins and custom registrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::counter::{CounterDefinition, CustomCounter};
use super::milestone::MilestoneConfig;
use super::notification::NotificationPreferences;
use crate::constants::counters;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current settings schema version
pub const SETTINGS_VERSION: u32 = 1;

const fn enabled() -> bool {
    true
}

/// Chat bot behaviour for one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    /// Whether chat integration is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Post a chat message when a milestone is crossed
    #[serde(default = "enabled")]
    pub announce_milestones: bool,
    /// Echo the new value after an accepted mutating command
    #[serde(default = "enabled")]
    pub echo_mutations: bool,
    /// Allow VIPs to run mutating commands
    #[serde(default)]
    pub allow_vips: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            announce_milestones: true,
            echo_mutations: true,
            allow_vips: false,
        }
    }
}

/// All configuration of one tenant
///
/// Every field is populated; missing data was resolved to defaults when the settings
/// entered the system (see the server's `settings::migrate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Schema version, always [`SETTINGS_VERSION`] once loaded
    pub version: u32,
    /// Registered custom counters
    #[serde(default)]
    pub custom_counters: Vec<CustomCounter>,
    /// Milestone thresholds per counter
    #[serde(default)]
    pub milestones: MilestoneConfig,
    /// Notification routing preferences
    #[serde(default)]
    pub notifications: NotificationPreferences,
    /// Chat bot behaviour
    #[serde(default)]
    pub bot: BotSettings,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            custom_counters: Vec::new(),
            milestones: MilestoneConfig::default(),
            notifications: NotificationPreferences::default(),
            bot: BotSettings::default(),
        }
    }
}

impl TenantSettings {
    /// Resolve a counter key to its definition
    #[must_use]
    pub fn counter(&self, key: &str) -> Option<CounterDefinition> {
        CounterDefinition::builtin(key).or_else(|| {
            self.custom_counters
                .iter()
                .find(|custom| custom.key == key)
                .map(CustomCounter::definition)
        })
    }

    /// Every counter the tenant can mutate, built-ins first
    #[must_use]
    pub fn counters(&self) -> Vec<CounterDefinition> {
        let mut all = CounterDefinition::builtins();
        all.extend(self.custom_counters.iter().map(CustomCounter::definition));
        all
    }

    /// Validate cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for invalid or duplicate custom counters, or too many of them
    pub fn validate(&self) -> AppResult<()> {
        if self.custom_counters.len() > counters::MAX_CUSTOM_COUNTERS {
            return Err(AppError::invalid_input(format!(
                "at most {} custom counters are allowed",
                counters::MAX_CUSTOM_COUNTERS
            )));
        }
        let mut seen = HashSet::new();
        for custom in &self.custom_counters {
            custom.validate()?;
            if !seen.insert(custom.key.as_str()) {
                return Err(AppError::invalid_input(format!(
                    "duplicate custom counter '{}'",
                    custom.key
                )));
            }
        }
        Ok(())
    }
}
