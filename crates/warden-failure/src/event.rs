//! Failure events
//!
//! A [`FailureEvent`] records one refusal or execution error. It carries a
//! fixed `triggering_condition` and a closed [`FailureType`]; there is
//! deliberately no free-text explanation field.

use crate::error::FailureError;
use crate::failure_type::FailureType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline phase in which a failure was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePhase {
    /// Capturing execution context
    ContextCapture,
    /// Declaring the capability intent
    IntentDeclaration,
    /// Authority decision
    Authorization,
    /// Multi-step composition
    Composition,
    /// Capability execution
    Execution,
    /// Evidence capture
    Evidence,
}

impl FailurePhase {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextCapture => "CONTEXT_CAPTURE",
            Self::IntentDeclaration => "INTENT_DECLARATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Composition => "COMPOSITION",
            Self::Execution => "EXECUTION",
            Self::Evidence => "EVIDENCE",
        }
    }
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authority identifiers in effect when the failure occurred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorityContext {
    /// Principal the call ran as
    pub principal_id: Option<String>,
    /// Grant the call relied on
    pub grant_id: Option<String>,
}

impl AuthorityContext {
    /// Whether neither identifier is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principal_id.is_none() && self.grant_id.is_none()
    }
}

/// Immutable record of one refusal or execution error
///
/// # Invariants
/// - `failure_id` and `triggering_condition` are non-empty
/// - `timestamp` is a positive epoch-milliseconds value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFailureEvent")]
pub struct FailureEvent {
    failure_id: String,
    phase: FailurePhase,
    failure_type: FailureType,
    triggering_condition: String,
    timestamp: i64,
    step_id: Option<String>,
    violated_invariant: Option<String>,
    authority_context: Option<AuthorityContext>,
    snapshot_id: Option<String>,
}

impl FailureEvent {
    /// Create a validated event with no optional fields
    ///
    /// # Errors
    /// Returns error if `failure_id` or `triggering_condition` is empty, or
    /// `timestamp` is not positive
    pub fn new(
        failure_id: impl Into<String>,
        phase: FailurePhase,
        failure_type: FailureType,
        triggering_condition: impl Into<String>,
        timestamp: i64,
    ) -> Result<Self, FailureError> {
        let failure_id = failure_id.into();
        let triggering_condition = triggering_condition.into();

        if failure_id.trim().is_empty() {
            return Err(FailureError::EmptyFailureId);
        }
        if triggering_condition.trim().is_empty() {
            return Err(FailureError::EmptyTriggeringCondition);
        }
        if timestamp <= 0 {
            return Err(FailureError::InvalidTimestamp(timestamp));
        }

        Ok(Self {
            failure_id,
            phase,
            failure_type,
            triggering_condition,
            timestamp,
            step_id: None,
            violated_invariant: None,
            authority_context: None,
            snapshot_id: None,
        })
    }

    /// Construct without validation; callers guarantee the invariants
    pub(crate) fn unchecked(
        failure_id: String,
        phase: FailurePhase,
        failure_type: FailureType,
        triggering_condition: String,
        timestamp: i64,
    ) -> Self {
        debug_assert!(!failure_id.is_empty() && !triggering_condition.is_empty() && timestamp > 0);
        Self {
            failure_id,
            phase,
            failure_type,
            triggering_condition,
            timestamp,
            step_id: None,
            violated_invariant: None,
            authority_context: None,
            snapshot_id: None,
        }
    }

    /// Attach the step the failure belongs to
    #[must_use]
    pub fn with_step_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    /// Attach the invariant identifier that was violated
    #[must_use]
    pub fn with_violated_invariant(mut self, invariant: impl Into<String>) -> Self {
        self.violated_invariant = Some(invariant.into());
        self
    }

    /// Attach the authority identifiers; an empty context is dropped
    #[must_use]
    pub fn with_authority_context(mut self, context: AuthorityContext) -> Self {
        self.authority_context = (!context.is_empty()).then_some(context);
        self
    }

    /// Attach the authority snapshot id
    #[must_use]
    pub fn with_snapshot_id(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    /// Unique failure id
    #[inline]
    #[must_use]
    pub fn failure_id(&self) -> &str {
        &self.failure_id
    }

    /// Phase the failure occurred in
    #[inline]
    #[must_use]
    pub fn phase(&self) -> FailurePhase {
        self.phase
    }

    /// Closed classification
    #[inline]
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        self.failure_type
    }

    /// Fixed condition that triggered the failure
    #[inline]
    #[must_use]
    pub fn triggering_condition(&self) -> &str {
        &self.triggering_condition
    }

    /// Epoch milliseconds
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Step id, if the failure belongs to a step
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> Option<&str> {
        self.step_id.as_deref()
    }

    /// Violated invariant identifier
    #[inline]
    #[must_use]
    pub fn violated_invariant(&self) -> Option<&str> {
        self.violated_invariant.as_deref()
    }

    /// Authority identifiers
    #[inline]
    #[must_use]
    pub fn authority_context(&self) -> Option<&AuthorityContext> {
        self.authority_context.as_ref()
    }

    /// Authority snapshot id
    #[inline]
    #[must_use]
    pub fn snapshot_id(&self) -> Option<&str> {
        self.snapshot_id.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFailureEvent {
    failure_id: String,
    phase: FailurePhase,
    failure_type: FailureType,
    triggering_condition: String,
    timestamp: i64,
    #[serde(default)]
    step_id: Option<String>,
    #[serde(default)]
    violated_invariant: Option<String>,
    #[serde(default)]
    authority_context: Option<AuthorityContext>,
    #[serde(default)]
    snapshot_id: Option<String>,
}

impl TryFrom<RawFailureEvent> for FailureEvent {
    type Error = FailureError;

    fn try_from(raw: RawFailureEvent) -> Result<Self, Self::Error> {
        let mut event = Self::new(
            raw.failure_id,
            raw.phase,
            raw.failure_type,
            raw.triggering_condition,
            raw.timestamp,
        )?;
        event.step_id = raw.step_id;
        event.violated_invariant = raw.violated_invariant;
        event.authority_context = raw.authority_context;
        event.snapshot_id = raw.snapshot_id;
        Ok(event)
    }
}
