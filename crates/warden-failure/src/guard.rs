//! Failure Guard
//!
//! Wraps one Authority Guard call at a time and turns every refusal or raised
//! error into a [`FailureEvent`]. Events accumulate on the guard instance
//! until [`FailureGuard::clear_failures`] is called; there is no implicit
//! reset between calls.

use crate::composition::{FailureComposition, FailureResult};
use crate::error::FailureError;
use crate::event::{AuthorityContext, FailureEvent, FailurePhase};
use crate::failure_type::FailureType;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use warden_authority::{
    call_guard, now_millis, AuthorityGuard, Context, ExecutionOutcome, NonAction, Payload,
};

/// Context key carrying the principal identifier
pub const PRINCIPAL_ID_KEY: &str = "principal_id";
/// Context key carrying the grant identifier
pub const GRANT_ID_KEY: &str = "grant_id";
/// Context key carrying the authority snapshot identifier
pub const SNAPSHOT_ID_KEY: &str = "snapshot_id";

/// A recorded failure and the refusal it came from
#[derive(Debug, Clone, PartialEq)]
pub struct FailureEnvelope {
    /// Recorded event
    pub event: FailureEvent,
    /// Refusal returned by the authority; `None` when the authority raised
    pub non_action: Option<NonAction>,
}

/// Outcome of one tracked call
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedOutcome {
    /// Authority permitted and executed the capability
    Success {
        /// Capability result data
        data: Payload,
        /// Authority snapshot id
        snapshot_id: String,
    },
    /// Authority refused or raised; the event was recorded
    Failure(FailureEnvelope),
}

impl TrackedOutcome {
    /// Whether the capability executed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Recorded failure, if any
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&FailureEnvelope> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(envelope) => Some(envelope),
        }
    }
}

fn context_str(context: &Context, key: &str) -> Option<String> {
    match context.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Session-scoped failure recorder over an Authority Guard
///
/// The failure list is a critical section; one instance shared across
/// concurrent logical compositions interleaves their failures.
pub struct FailureGuard {
    authority: Arc<dyn AuthorityGuard>,
    failures: Mutex<Vec<FailureEvent>>,
}

impl std::fmt::Debug for FailureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureGuard")
            .field("failures", &self.failures.lock().len())
            .finish_non_exhaustive()
    }
}

impl FailureGuard {
    /// Create a guard with an empty failure list
    #[must_use]
    pub fn new(authority: Arc<dyn AuthorityGuard>) -> Self {
        Self {
            authority,
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Execute one capability, recording a failure on refusal or error
    ///
    /// Success is returned unchanged and records nothing.
    pub fn execute_with_failure_tracking(
        &self,
        capability_name: &str,
        context: &Context,
        phase: FailurePhase,
        step_id: Option<&str>,
    ) -> TrackedOutcome {
        let (failure_type, triggering_condition, non_action) =
            match call_guard(self.authority.as_ref(), capability_name, context) {
                Ok(ExecutionOutcome::Success { data, snapshot_id }) => {
                    return TrackedOutcome::Success { data, snapshot_id };
                }
                Ok(ExecutionOutcome::Refused { non_action }) => (
                    FailureType::from_reason(&non_action.reason),
                    format!("Non-Action reason: {}", non_action.reason),
                    Some(non_action),
                ),
                Err(err) => (FailureType::ExecutionError, err.to_string(), None),
            };
        let triggering_condition = if triggering_condition.trim().is_empty() {
            failure_type.as_str().to_string()
        } else {
            triggering_condition
        };

        let authority_context = AuthorityContext {
            principal_id: context_str(context, PRINCIPAL_ID_KEY),
            grant_id: context_str(context, GRANT_ID_KEY),
        };
        let snapshot_id = context_str(context, SNAPSHOT_ID_KEY);

        let event = {
            let mut failures = self.failures.lock();
            // Clamp so a wall clock step backwards keeps the list ordered.
            let timestamp = failures
                .last()
                .map_or_else(now_millis, |last| now_millis().max(last.timestamp()));

            let event = FailureEvent::unchecked(
                Uuid::new_v4().to_string(),
                phase,
                failure_type,
                triggering_condition,
                timestamp.max(1),
            );
            let mut event = event.with_authority_context(authority_context);
            if let Some(step_id) = step_id {
                event = event.with_step_id(step_id);
            }
            if let Some(snapshot_id) = snapshot_id {
                event = event.with_snapshot_id(snapshot_id);
            }
            failures.push(event.clone());
            event
        };

        tracing::warn!(
            capability = capability_name,
            failure_id = event.failure_id(),
            failure_type = %event.failure_type(),
            phase = %event.phase(),
            "failure recorded"
        );

        TrackedOutcome::Failure(FailureEnvelope { event, non_action })
    }

    /// Append an externally built event
    ///
    /// # Errors
    /// Returns error if the event is older than the last recorded failure
    pub fn record_failure(&self, event: FailureEvent) -> Result<(), FailureError> {
        let mut failures = self.failures.lock();
        if let Some(last) = failures.last() {
            if event.timestamp() < last.timestamp() {
                return Err(FailureError::OutOfOrder {
                    index: failures.len(),
                    timestamp: event.timestamp(),
                    previous: last.timestamp(),
                });
            }
        }
        tracing::debug!(
            failure_id = event.failure_id(),
            failure_type = %event.failure_type(),
            "failure appended"
        );
        failures.push(event);
        Ok(())
    }

    /// Whether any failure has been recorded since the last clear
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.lock().is_empty()
    }

    /// Number of recorded failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.lock().len()
    }

    /// Copy of the recorded failures in order
    #[must_use]
    pub fn failures(&self) -> Vec<FailureEvent> {
        self.failures.lock().clone()
    }

    /// Recorded failures as a composition
    ///
    /// A fresh UUID is used when `composition_id` is `None`.
    ///
    /// # Errors
    /// Returns [`FailureError::NoFailuresRecorded`] if nothing was recorded
    pub fn get_failure_composition(
        &self,
        composition_id: Option<&str>,
    ) -> Result<FailureComposition, FailureError> {
        let failures = self.failures();
        if failures.is_empty() {
            return Err(FailureError::NoFailuresRecorded);
        }
        let composition_id =
            composition_id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        FailureComposition::new(composition_id, failures)
    }

    /// Recorded failures as a terminal result
    ///
    /// # Errors
    /// Returns [`FailureError::NoFailuresRecorded`] if nothing was recorded
    pub fn get_failure_result(
        &self,
        composition_id: Option<&str>,
    ) -> Result<FailureResult, FailureError> {
        let failures = self.failures();
        if failures.is_empty() {
            return Err(FailureError::NoFailuresRecorded);
        }
        FailureResult::new(composition_id.map(str::to_string), failures, true)
    }

    /// Drop every recorded failure
    pub fn clear_failures(&self) {
        let mut failures = self.failures.lock();
        tracing::debug!("clearing {} failures", failures.len());
        failures.clear();
    }
}
