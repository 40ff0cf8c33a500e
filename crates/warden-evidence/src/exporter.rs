//! Evidence store and export
//!
//! The exporter keeps sealed bundles keyed by `bundle_id`. Writes take the
//! write lock; export and verification only read. There is no eviction:
//! retention is the caller's policy, applied through [`EvidenceExporter::remove_bundle`].

use crate::bundle::EvidenceBundle;
use crate::error::EvidenceError;
use crate::verify::{verify_bytes, VerificationResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use warden_hash::canonical_bytes;

/// In-memory bundle store with canonical export
#[derive(Debug, Default)]
pub struct EvidenceExporter {
    bundles: RwLock<HashMap<String, Arc<EvidenceBundle>>>,
}

impl EvidenceExporter {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bundle, replacing any bundle with the same id
    pub fn store_bundle(&self, bundle: Arc<EvidenceBundle>) {
        let id = bundle.bundle_id().to_string();
        tracing::debug!(bundle_id = %id, "storing evidence bundle");
        if self.bundles.write().insert(id.clone(), bundle).is_some() {
            tracing::warn!(bundle_id = %id, "replaced existing evidence bundle");
        }
    }

    /// Stored bundle by id
    #[must_use]
    pub fn get_bundle(&self, bundle_id: &str) -> Option<Arc<EvidenceBundle>> {
        self.bundles.read().get(bundle_id).cloned()
    }

    /// Ids of every stored bundle, sorted
    #[must_use]
    pub fn bundle_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bundles.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of stored bundles
    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.read().is_empty()
    }

    /// Drop a bundle from the store
    pub fn remove_bundle(&self, bundle_id: &str) -> Option<Arc<EvidenceBundle>> {
        let removed = self.bundles.write().remove(bundle_id);
        if removed.is_some() {
            tracing::debug!(bundle_id, "removed evidence bundle");
        }
        removed
    }

    /// Canonical JSON bytes of a stored bundle
    ///
    /// # Errors
    /// Returns [`EvidenceError::BundleNotFound`] for an unknown id
    pub fn export_bundle(&self, bundle_id: &str) -> Result<Vec<u8>, EvidenceError> {
        let bundle = self
            .get_bundle(bundle_id)
            .ok_or_else(|| EvidenceError::BundleNotFound(bundle_id.to_string()))?;
        Ok(canonical_bytes(&bundle.canonical_value()))
    }

    /// Write a stored bundle's canonical bytes to `path`
    ///
    /// The write is not atomic.
    ///
    /// # Errors
    /// Returns error for an unknown id or a failed write
    pub fn export_bundle_to_file(
        &self,
        bundle_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), EvidenceError> {
        let path = path.as_ref();
        let bytes = self.export_bundle(bundle_id)?;
        std::fs::write(path, &bytes).map_err(|source| EvidenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            bundle_id,
            path = %path.display(),
            bytes = bytes.len(),
            "exported evidence bundle"
        );
        Ok(())
    }

    /// Verify exported bundle bytes
    #[must_use]
    pub fn verify_bundle(&self, bytes: &[u8]) -> VerificationResult {
        let result = verify_bytes(bytes);
        if result.is_valid {
            tracing::debug!(bundle_id = ?result.bundle_id, "bundle verified");
        } else {
            tracing::warn!(
                bundle_id = ?result.bundle_id,
                errors = result.errors.len(),
                "bundle failed verification"
            );
        }
        result
    }

    /// Read and verify a bundle file
    ///
    /// A read failure is reported as an all-false result.
    #[must_use]
    pub fn verify_bundle_from_file(&self, path: impl AsRef<Path>) -> VerificationResult {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => self.verify_bundle(&bytes),
            Err(err) => VerificationResult::failed(format!(
                "failed to read {}: {err}",
                path.display()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::tests::success_parts;

    fn stored() -> (EvidenceExporter, Arc<EvidenceBundle>) {
        let exporter = EvidenceExporter::new();
        let bundle = Arc::new(EvidenceBundle::seal(success_parts()).unwrap());
        exporter.store_bundle(Arc::clone(&bundle));
        (exporter, bundle)
    }

    #[test]
    fn store_get_remove() {
        let (exporter, bundle) = stored();
        assert_eq!(exporter.len(), 1);
        assert_eq!(exporter.bundle_ids(), vec!["b-1".to_string()]);
        assert!(Arc::ptr_eq(&exporter.get_bundle("b-1").unwrap(), &bundle));

        assert!(exporter.remove_bundle("b-1").is_some());
        assert!(exporter.is_empty());
        assert!(exporter.remove_bundle("b-1").is_none());
    }

    #[test]
    fn export_is_deterministic() {
        let (exporter, _) = stored();
        let first = exporter.export_bundle("b-1").unwrap();
        let second = exporter.export_bundle("b-1").unwrap();
        assert_eq!(first, second);
        assert!(exporter.verify_bundle(&first).is_valid);
    }

    #[test]
    fn unknown_bundle_is_an_error() {
        let exporter = EvidenceExporter::new();
        assert!(matches!(
            exporter.export_bundle("missing"),
            Err(EvidenceError::BundleNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn missing_file_is_all_false() {
        let exporter = EvidenceExporter::new();
        let result = exporter.verify_bundle_from_file("/nonexistent/warden/bundle.json");
        assert!(!result.is_valid);
        assert!(result.errors[0].starts_with("failed to read"));
    }
}
