// ABOUTME: Counter definitions, custom counter registration, and counter snapshots
// ABOUTME: Built-in counters plus tenant-registered custom counters with display metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use super::tenant::TenantId;
use crate::constants::{categories, counters};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fully resolved counter definition used by the engine, router, and bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDefinition {
    /// Stable counter key (`deaths`, `swears`, or a custom key)
    pub key: String,
    /// Display name for overlays and embeds
    pub display_name: String,
    /// Emoji or icon shown next to the value
    pub icon: String,
    /// Amount added by an increment
    pub increment_by: u64,
    /// Amount removed by a decrement
    pub decrement_by: u64,
    /// Extra chat alias (`!<alias>+`)
    pub alias: Option<String>,
    /// Whether this is one of the built-in counters
    pub builtin: bool,
}

impl CounterDefinition {
    fn builtin_def(key: &str, display_name: &str, icon: &str) -> Self {
        Self {
            key: key.to_owned(),
            display_name: display_name.to_owned(),
            icon: icon.to_owned(),
            increment_by: 1,
            decrement_by: 1,
            alias: None,
            builtin: true,
        }
    }

    /// All built-in counters in display order
    #[must_use]
    pub fn builtins() -> Vec<Self> {
        vec![
            Self::builtin_def(counters::DEATHS, "Deaths", "💀"),
            Self::builtin_def(counters::SWEARS, "Swears", "🤬"),
            Self::builtin_def(counters::SCREAMS, "Screams", "😱"),
        ]
    }

    /// Look up a built-in counter by key
    #[must_use]
    pub fn builtin(key: &str) -> Option<Self> {
        Self::builtins().into_iter().find(|def| def.key == key)
    }

    /// Whether `key` names a built-in counter
    #[must_use]
    pub fn is_builtin_key(key: &str) -> bool {
        matches!(key, counters::DEATHS | counters::SWEARS | counters::SCREAMS)
    }

    /// Singular stem used by chat commands (`deaths` -> `death`)
    #[must_use]
    pub fn stem(&self) -> &str {
        match self.key.strip_suffix('s') {
            Some(stem) if !stem.is_empty() => stem,
            _ => &self.key,
        }
    }

    /// Notification preference category for milestones of this counter
    #[must_use]
    pub fn milestone_category(&self) -> String {
        format!("{}{}", self.key, categories::MILESTONE_SUFFIX)
    }
}

/// Validate a custom counter key
///
/// # Errors
///
/// Returns `InvalidInput` when the key is empty, too long, or not `[a-z0-9_]`
pub fn validate_counter_key(key: &str) -> AppResult<()> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if key.is_empty() || key.len() > counters::MAX_COUNTER_NAME_LEN || !valid_chars {
        return Err(AppError::invalid_input(format!(
            "counter key '{key}' must be 1-{} characters of a-z, 0-9 or _",
            counters::MAX_COUNTER_NAME_LEN
        )));
    }
    Ok(())
}

const fn one() -> u64 {
    1
}

/// Tenant-registered custom counter as stored in settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCounter {
    /// Counter key
    pub key: String,
    /// Display name
    pub display_name: String,
    /// Optional icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Increment step
    #[serde(default = "one")]
    pub increment_by: u64,
    /// Decrement step
    #[serde(default = "one")]
    pub decrement_by: u64,
    /// Optional chat alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl CustomCounter {
    /// Validate the counter registration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad keys, built-in collisions, or zero steps
    pub fn validate(&self) -> AppResult<()> {
        validate_counter_key(&self.key)?;
        if CounterDefinition::is_builtin_key(&self.key) {
            return Err(AppError::invalid_input(format!(
                "'{}' is a built-in counter",
                self.key
            )));
        }
        if self.increment_by == 0 || self.decrement_by == 0 {
            return Err(AppError::invalid_input(format!(
                "counter '{}' must have non-zero increment and decrement steps",
                self.key
            )));
        }
        if let Some(alias) = &self.alias {
            validate_counter_key(alias)?;
        }
        Ok(())
    }

    /// Resolve into a [`CounterDefinition`]
    #[must_use]
    pub fn definition(&self) -> CounterDefinition {
        let display_name = if self.display_name.trim().is_empty() {
            self.key.clone()
        } else {
            self.display_name.trim().to_owned()
        };
        CounterDefinition {
            key: self.key.clone(),
            display_name,
            icon: self
                .icon
                .clone()
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or_else(|| counters::DEFAULT_CUSTOM_ICON.to_owned()),
            increment_by: self.increment_by,
            decrement_by: self.decrement_by,
            alias: self.alias.clone(),
            builtin: false,
        }
    }
}

/// Persisted value of a single counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterValue {
    /// Current value, never negative
    pub value: u64,
    /// When the value was last written
    pub updated_at: DateTime<Utc>,
}

/// All counters of one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Counter key to value
    pub counters: BTreeMap<String, u64>,
    /// Most recent write across all counters, `None` before the first mutation
    pub updated_at: Option<DateTime<Utc>>,
}

impl CounterSnapshot {
    /// Empty snapshot for a tenant that has never mutated a counter
    #[must_use]
    pub const fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            counters: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Value of a counter, zero when never written
    #[must_use]
    pub fn value(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Fold a persisted counter value into the snapshot
    pub fn record(&mut self, key: impl Into<String>, value: CounterValue) {
        self.counters.insert(key.into(), value.value);
        if self.updated_at.map_or(true, |at| value.updated_at > at) {
            self.updated_at = Some(value.updated_at);
        }
    }
}
