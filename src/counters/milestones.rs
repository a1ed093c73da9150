// ABOUTME: Milestone detector deciding which thresholds a counter change crossed
// ABOUTME: Pure function of (previous, new, thresholds), only upward crossings count
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

/// Thresholds crossed by a change from `previous` to `new`
///
/// A threshold `t` is crossed iff `previous < t <= new`. The result is ascending.
/// Downward or unchanged values never cross anything.
#[must_use]
pub fn detect(previous: u64, new: u64, thresholds: &[u64]) -> Vec<u64> {
    if new <= previous {
        return Vec::new();
    }
    let mut crossed: Vec<u64> = thresholds
        .iter()
        .copied()
        .filter(|t| previous < *t && *t <= new)
        .collect();
    crossed.sort_unstable();
    crossed.dedup();
    crossed
}
