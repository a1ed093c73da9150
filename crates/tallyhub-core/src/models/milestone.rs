// ABOUTME: Milestone thresholds and the per-counter milestone configuration
// ABOUTME: Normalizes thresholds at the boundary and supplies default sets for built-ins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::constants::counters;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ascending list of distinct positive thresholds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct Thresholds(Vec<u64>);

impl Thresholds {
    /// Build a normalized threshold list
    ///
    /// Input order and duplicates are irrelevant; the result is sorted and distinct.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any threshold is zero
    pub fn new(mut values: Vec<u64>) -> AppResult<Self> {
        if values.contains(&0) {
            return Err(AppError::invalid_input(
                "milestone thresholds must be positive",
            ));
        }
        values.sort_unstable();
        values.dedup();
        Ok(Self(values))
    }

    /// Normalize, silently dropping zero entries
    #[must_use]
    pub fn lenient(values: impl IntoIterator<Item = u64>) -> Self {
        let mut values: Vec<u64> = values.into_iter().filter(|v| *v > 0).collect();
        values.sort_unstable();
        values.dedup();
        Self(values)
    }

    /// Thresholds as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Whether no thresholds are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u64>> for Thresholds {
    type Error = AppError;

    fn try_from(values: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Thresholds> for Vec<u64> {
    fn from(thresholds: Thresholds) -> Self {
        thresholds.0
    }
}

/// Default thresholds for a counter that has no explicit configuration
#[must_use]
pub fn default_thresholds(counter: &str) -> &'static [u64] {
    match counter {
        counters::DEATHS => counters::DEFAULT_DEATH_MILESTONES,
        counters::SWEARS => counters::DEFAULT_SWEAR_MILESTONES,
        counters::SCREAMS => counters::DEFAULT_SCREAM_MILESTONES,
        _ => &[],
    }
}

/// Milestone thresholds per counter key
///
/// A counter with an explicit entry uses it, even when empty (milestones switched off).
/// Built-ins without an entry use their default set; custom counters default to none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneConfig(BTreeMap<String, Thresholds>);

impl MilestoneConfig {
    /// Thresholds that apply to `counter`
    #[must_use]
    pub fn for_counter(&self, counter: &str) -> &[u64] {
        self.0
            .get(counter)
            .map_or_else(|| default_thresholds(counter), Thresholds::as_slice)
    }

    /// Replace the thresholds of one counter
    pub fn set(&mut self, counter: impl Into<String>, thresholds: Thresholds) {
        self.0.insert(counter.into(), thresholds);
    }

    /// Drop the explicit entry of a counter
    pub fn remove(&mut self, counter: &str) {
        self.0.remove(counter);
    }

    /// Counters with an explicit entry
    pub fn configured(&self) -> impl Iterator<Item = (&String, &Thresholds)> {
        self.0.iter()
    }
}
