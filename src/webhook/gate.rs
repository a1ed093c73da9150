// ABOUTME: Per-tenant dispatch epochs used to drop queued webhook attempts after cancellation
// ABOUTME: Bumping a tenant's epoch invalidates every job stamped with an older one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use dashmap::DashMap;
use tallyhub_core::models::TenantId;

/// Cancellation gate for pending webhook deliveries
#[derive(Debug, Default)]
pub struct DispatchGate {
    epochs: DashMap<TenantId, u64>,
}

impl DispatchGate {
    /// Create an empty gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch to stamp on a new job
    #[must_use]
    pub fn current(&self, tenant: &TenantId) -> u64 {
        self.epochs.get(tenant).map_or(0, |epoch| *epoch)
    }

    /// Whether a job stamped with `epoch` may still run
    #[must_use]
    pub fn is_current(&self, tenant: &TenantId, epoch: u64) -> bool {
        self.current(tenant) == epoch
    }

    /// Invalidate every pending job of a tenant, returning the new epoch
    pub fn cancel(&self, tenant: &TenantId) -> u64 {
        let mut epoch = self.epochs.entry(tenant.clone()).or_insert(0);
        *epoch += 1;
        *epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_invalidates_older_epochs() {
        let gate = DispatchGate::new();
        let a = TenantId::parse("a").unwrap();
        let b = TenantId::parse("b").unwrap();
        let stamped = gate.current(&a);
        assert!(gate.is_current(&a, stamped));

        gate.cancel(&a);
        assert!(!gate.is_current(&a, stamped));
        assert!(gate.is_current(&a, gate.current(&a)));
        assert!(gate.is_current(&b, 0));
    }
}
