// ABOUTME: Tenant identifier newtype used as the unit of isolation for all state
// ABOUTME: Validates the external streamer id once at the boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted tenant id length
const MAX_TENANT_ID_LEN: usize = 64;

/// Type-safe wrapper for tenant identifiers
///
/// A tenant is one streamer account. Ids are the platform user id (or login) and may
/// contain ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse and validate a tenant id
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the id is empty, too long, or contains other characters
    pub fn parse(raw: &str) -> AppResult<Self> {
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if raw.is_empty() || raw.len() > MAX_TENANT_ID_LEN || !valid_chars {
            return Err(AppError::invalid_input(format!("invalid tenant id '{raw}'")));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(tenant_id: TenantId) -> Self {
        tenant_id.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_validation() {
        assert!(TenantId::parse("123456789").is_ok());
        assert!(TenantId::parse("some_streamer-2").is_ok());
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("has space").is_err());
        assert!(TenantId::parse("../etc").is_err());
    }

    #[test]
    fn test_tenant_id_serde_validates() {
        let ok: TenantId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<TenantId>("\"a b\"").is_err());
    }
}
