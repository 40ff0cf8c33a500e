//! Evidence Guard
//!
//! Wraps one Authority Guard call and always produces exactly one sealed
//! bundle, whatever the outcome. Snapshots are taken before the call; the
//! bundle is sealed only after the call has returned.

use crate::bundle::{BundleParts, BundleResults, EvidenceBundle};
use crate::config::EvidenceConfig;
use crate::error::EvidenceError;
use crate::exporter::EvidenceExporter;
use crate::snapshot::{
    ContextSnapshot, ExecutionSnapshot, GrantSnapshot, IntentSnapshot, PrincipalSnapshot,
};
use std::sync::Arc;
use uuid::Uuid;
use warden_authority::{call_fail_closed, now_millis, AuthorityGuard, Context, ExecutionOutcome, Payload};

/// Evidence-capturing wrapper around an Authority Guard
#[derive(Clone)]
pub struct EvidenceGuard {
    authority: Arc<dyn AuthorityGuard>,
    exporter: Arc<EvidenceExporter>,
    config: EvidenceConfig,
}

impl std::fmt::Debug for EvidenceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceGuard")
            .field("config", &self.config)
            .field("bundles", &self.exporter.len())
            .finish_non_exhaustive()
    }
}

impl EvidenceGuard {
    /// Create a guard storing bundles in `exporter`
    #[must_use]
    pub fn new(authority: Arc<dyn AuthorityGuard>, exporter: Arc<EvidenceExporter>) -> Self {
        Self {
            authority,
            exporter,
            config: EvidenceConfig::default(),
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: EvidenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Store the bundles are kept in
    #[inline]
    #[must_use]
    pub fn exporter(&self) -> &Arc<EvidenceExporter> {
        &self.exporter
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Execute one capability and capture a sealed, stored bundle
    ///
    /// Refusals and raised authority errors end up in the bundle's
    /// `failure_composition`; they are never returned as `Err`.
    ///
    /// # Errors
    /// Returns error only for invalid input, such as an empty capability
    /// name or an empty configured authority version. Either is rejected
    /// before the Authority Guard is called.
    pub fn execute_with_evidence(
        &self,
        capability_name: &str,
        context: &Context,
        grant: Option<&Payload>,
        step_id: Option<&str>,
    ) -> Result<Arc<EvidenceBundle>, EvidenceError> {
        if capability_name.trim().is_empty() {
            return Err(EvidenceError::EmptyField("capability_name"));
        }
        // Must precede the call so no execution goes unrecorded.
        self.config.validate()?;

        let span = tracing::info_span!("evidence", capability = capability_name, step_id);
        let _enter = span.enter();

        let captured_at = now_millis();
        let context_snapshot = ContextSnapshot::capture(context, captured_at);
        let intent_snapshot = IntentSnapshot::declare(capability_name, step_id, captured_at);
        let principal_snapshot =
            PrincipalSnapshot::capture(context, &self.config.principal_key, captured_at);
        let grant_snapshot = grant
            .map(|data| GrantSnapshot::capture(data, context, &self.config.grant_key, captured_at));

        let outcome = call_fail_closed(self.authority.as_ref(), capability_name, context);
        let executed_at = now_millis().max(captured_at);

        let (failure_composition, results) = match &outcome {
            ExecutionOutcome::Success { data, snapshot_id } => (
                None,
                Some(BundleResults {
                    data: data.clone(),
                    snapshot_id: snapshot_id.clone(),
                }),
            ),
            ExecutionOutcome::Refused { non_action } => (Some(non_action.clone()), None),
        };

        let execution = ExecutionSnapshot::record(
            capability_name,
            step_id,
            *context_snapshot.context_hash(),
            executed_at,
            outcome,
        );

        let bundle = EvidenceBundle::seal(BundleParts {
            bundle_id: Uuid::new_v4().to_string(),
            created_at: executed_at,
            context_snapshot,
            intent_snapshot,
            principal_snapshot,
            grant_snapshot,
            execution_snapshots: vec![execution],
            authority_version: self.config.authority_version.clone(),
            failure_composition,
            results,
        })?;

        tracing::info!(
            bundle_id = bundle.bundle_id(),
            is_success = bundle.is_success(),
            root = %bundle.hash_chain_root().short(),
            "evidence bundle sealed"
        );

        let bundle = Arc::new(bundle);
        self.exporter.store_bundle(Arc::clone(&bundle));
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_authority::{AuthorityError, FnAuthorityGuard, NonAction};

    fn guard(authority: impl AuthorityGuard + 'static) -> EvidenceGuard {
        EvidenceGuard::new(Arc::new(authority), Arc::new(EvidenceExporter::new()))
    }

    #[test]
    fn empty_capability_rejected() {
        let guard = guard(FnAuthorityGuard::new(|_: &str, _: &Context| {
            Ok(ExecutionOutcome::success(Payload::new(), "s"))
        }));
        assert!(matches!(
            guard.execute_with_evidence("", &Context::new(), None, None),
            Err(EvidenceError::EmptyField("capability_name"))
        ));
        assert!(guard.exporter().is_empty());
    }

    #[test]
    fn refusal_populates_failure_composition() {
        let guard = guard(FnAuthorityGuard::new(|_: &str, _: &Context| {
            Ok(ExecutionOutcome::refused(NonAction::new("NO_GRANT", 3)))
        }));
        let bundle = guard
            .execute_with_evidence("files.delete", &Context::new(), None, Some("s2"))
            .unwrap();
        assert!(!bundle.is_success());
        assert!(bundle.results().is_none());
        assert_eq!(bundle.failure_composition().unwrap().reason, "NO_GRANT");
        assert_eq!(bundle.intent_snapshot().step_id(), Some("s2"));
        assert_eq!(bundle.principal_snapshot().principal_id(), "anonymous");
        assert!(bundle.verify_root());
    }

    #[test]
    fn raised_error_is_captured() {
        let guard = guard(FnAuthorityGuard::new(|_: &str, _: &Context| {
            Err(AuthorityError::unavailable("authority offline"))
        }));
        let bundle = guard
            .execute_with_evidence("files.read", &Context::new(), None, None)
            .unwrap();
        let failure = bundle.failure_composition().unwrap();
        assert_eq!(failure.reason, "EXECUTION_ERROR");
        assert!(failure.details["error"].as_str().unwrap().contains("authority offline"));
    }

    #[test]
    fn configured_authority_version_is_recorded() {
        let guard = guard(FnAuthorityGuard::new(|_: &str, _: &Context| {
            Ok(ExecutionOutcome::success(Payload::new(), "s"))
        }))
        .with_config(EvidenceConfig::new().with_authority_version("authority-2.4"));
        let bundle = guard
            .execute_with_evidence("files.read", &Context::new(), None, None)
            .unwrap();
        assert_eq!(bundle.authority_version(), "authority-2.4");
    }

    #[test]
    fn empty_authority_version_rejected_before_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guard = guard(FnAuthorityGuard::new(move |_: &str, _: &Context| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ExecutionOutcome::success(Payload::new(), "s"))
        }))
        .with_config(EvidenceConfig::new().with_authority_version(""));

        assert!(matches!(
            guard.execute_with_evidence("payments.send", &Context::new(), None, None),
            Err(EvidenceError::EmptyField("authority_version"))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(guard.exporter().is_empty());
    }
}
