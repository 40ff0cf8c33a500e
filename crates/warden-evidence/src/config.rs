//! Evidence Guard configuration

use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};

/// Evidence Guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Authority version recorded on every bundle
    pub authority_version: String,
    /// Context key read for the principal identity
    pub principal_key: String,
    /// Key read for the grant identity (grant data first, then context)
    pub grant_key: String,
}

impl EvidenceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With authority version
    #[inline]
    #[must_use]
    pub fn with_authority_version(mut self, version: impl Into<String>) -> Self {
        self.authority_version = version.into();
        self
    }

    /// With principal key
    #[inline]
    #[must_use]
    pub fn with_principal_key(mut self, key: impl Into<String>) -> Self {
        self.principal_key = key.into();
        self
    }

    /// With grant key
    #[inline]
    #[must_use]
    pub fn with_grant_key(mut self, key: impl Into<String>) -> Self {
        self.grant_key = key.into();
        self
    }

    /// Check every field is non-empty
    ///
    /// # Errors
    /// Returns [`EvidenceError::EmptyField`] naming the first empty field
    pub fn validate(&self) -> Result<(), EvidenceError> {
        for (field, value) in [
            ("authority_version", &self.authority_version),
            ("principal_key", &self.principal_key),
            ("grant_key", &self.grant_key),
        ] {
            if value.trim().is_empty() {
                return Err(EvidenceError::EmptyField(field));
            }
        }
        Ok(())
    }
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            authority_version: warden_authority::VERSION.to_string(),
            principal_key: "principal_id".to_string(),
            grant_key: "grant_id".to_string(),
        }
    }
}
