//! Closed failure taxonomy
//!
//! [`FailureType`] is fixed at compile time. Refusal reasons arriving as
//! strings are interpreted through [`FailureType::from_reason`], a total
//! function with an explicit `GUARD_REFUSAL` default arm.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject a failure type is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureSubject {
    /// Execution context
    Context,
    /// Declared intent
    Intent,
    /// Confidence value
    Confidence,
    /// Principal identity
    Principal,
    /// Grant
    Grant,
    /// Capability registry
    Capability,
    /// Authority decision point
    Authority,
    /// Friction (deliberate slowdown / confirmation)
    Friction,
    /// Authority snapshot
    Snapshot,
    /// Multi-step composition
    Composition,
    /// Capability execution
    Execution,
}

/// Structured failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    /// No context supplied
    MissingContext,
    /// Context malformed
    InvalidContext,
    /// No intent declared
    MissingIntent,
    /// Intent could not be pinned to one capability
    AmbiguousIntent,
    /// Confidence missing
    MissingConfidence,
    /// Confidence malformed or out of range
    InvalidConfidence,
    /// Confidence below the required threshold
    InsufficientConfidence,
    /// Principal missing
    MissingPrincipal,
    /// Principal not registered
    UnknownPrincipal,
    /// Principal malformed
    InvalidPrincipal,
    /// No grant for the capability
    MissingGrant,
    /// Grant expired
    ExpiredGrant,
    /// Grant revoked
    RevokedGrant,
    /// Grant usage exhausted
    ExhaustedGrant,
    /// Grant scope does not cover the request
    InvalidGrantScope,
    /// Capability not registered
    UnknownCapability,
    /// Capability registered but not permitted here
    CapabilityNotPermitted,
    /// Authority refused for a reason outside the mapping table
    GuardRefusal,
    /// Authority could not be reached
    AuthorityUnavailable,
    /// Friction step required before execution
    FrictionRequired,
    /// Friction step not satisfied
    FrictionNotSatisfied,
    /// Snapshot content hash mismatch
    SnapshotHashMismatch,
    /// Single-use snapshot reused
    SnapshotReuseAttempt,
    /// Snapshot past its validity window
    SnapshotExpired,
    /// State changed between check and use
    ToctouViolation,
    /// A composed step failed
    CompositionStepFailure,
    /// Composition halted under STRICT policy
    CompositionHalted,
    /// Composition failed construction invariants
    InvalidComposition,
    /// Capability call raised instead of returning
    ExecutionError,
    /// Capability call exceeded its time budget
    ExecutionTimeout,
}

impl FailureType {
    /// Every failure type, in declaration order
    pub const ALL: [FailureType; 30] = [
        Self::MissingContext,
        Self::InvalidContext,
        Self::MissingIntent,
        Self::AmbiguousIntent,
        Self::MissingConfidence,
        Self::InvalidConfidence,
        Self::InsufficientConfidence,
        Self::MissingPrincipal,
        Self::UnknownPrincipal,
        Self::InvalidPrincipal,
        Self::MissingGrant,
        Self::ExpiredGrant,
        Self::RevokedGrant,
        Self::ExhaustedGrant,
        Self::InvalidGrantScope,
        Self::UnknownCapability,
        Self::CapabilityNotPermitted,
        Self::GuardRefusal,
        Self::AuthorityUnavailable,
        Self::FrictionRequired,
        Self::FrictionNotSatisfied,
        Self::SnapshotHashMismatch,
        Self::SnapshotReuseAttempt,
        Self::SnapshotExpired,
        Self::ToctouViolation,
        Self::CompositionStepFailure,
        Self::CompositionHalted,
        Self::InvalidComposition,
        Self::ExecutionError,
        Self::ExecutionTimeout,
    ];

    /// Interpret an Authority Guard refusal reason
    ///
    /// Fixed table; any reason not listed maps to [`FailureType::GuardRefusal`].
    #[must_use]
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "MISSING_CONFIDENCE" => Self::MissingConfidence,
            "INVALID_CONFIDENCE" => Self::InvalidConfidence,
            "MISSING_PRINCIPAL" => Self::MissingPrincipal,
            "UNKNOWN_PRINCIPAL" => Self::UnknownPrincipal,
            "NO_GRANT" => Self::MissingGrant,
            "EXPIRED_GRANT" => Self::ExpiredGrant,
            "REVOKED_GRANT" => Self::RevokedGrant,
            "EXHAUSTED_GRANT" => Self::ExhaustedGrant,
            "UNKNOWN_CAPABILITY" => Self::UnknownCapability,
            "INVALID_GRANT_SCOPE" => Self::InvalidGrantScope,
            "SNAPSHOT_HASH_MISMATCH" => Self::SnapshotHashMismatch,
            "SNAPSHOT_REUSE_ATTEMPT" => Self::SnapshotReuseAttempt,
            "TOCTOU_VIOLATION" => Self::ToctouViolation,
            "COMPOSITION_STEP_FAILURE" => Self::CompositionStepFailure,
            _ => Self::GuardRefusal,
        }
    }

    /// Subject grouping
    #[must_use]
    pub fn subject(self) -> FailureSubject {
        match self {
            Self::MissingContext | Self::InvalidContext => FailureSubject::Context,
            Self::MissingIntent | Self::AmbiguousIntent => FailureSubject::Intent,
            Self::MissingConfidence | Self::InvalidConfidence | Self::InsufficientConfidence => {
                FailureSubject::Confidence
            }
            Self::MissingPrincipal | Self::UnknownPrincipal | Self::InvalidPrincipal => {
                FailureSubject::Principal
            }
            Self::MissingGrant
            | Self::ExpiredGrant
            | Self::RevokedGrant
            | Self::ExhaustedGrant
            | Self::InvalidGrantScope => FailureSubject::Grant,
            Self::UnknownCapability | Self::CapabilityNotPermitted => FailureSubject::Capability,
            Self::GuardRefusal | Self::AuthorityUnavailable => FailureSubject::Authority,
            Self::FrictionRequired | Self::FrictionNotSatisfied => FailureSubject::Friction,
            Self::SnapshotHashMismatch
            | Self::SnapshotReuseAttempt
            | Self::SnapshotExpired
            | Self::ToctouViolation => FailureSubject::Snapshot,
            Self::CompositionStepFailure | Self::CompositionHalted | Self::InvalidComposition => {
                FailureSubject::Composition
            }
            Self::ExecutionError | Self::ExecutionTimeout => FailureSubject::Execution,
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingContext => "MISSING_CONTEXT",
            Self::InvalidContext => "INVALID_CONTEXT",
            Self::MissingIntent => "MISSING_INTENT",
            Self::AmbiguousIntent => "AMBIGUOUS_INTENT",
            Self::MissingConfidence => "MISSING_CONFIDENCE",
            Self::InvalidConfidence => "INVALID_CONFIDENCE",
            Self::InsufficientConfidence => "INSUFFICIENT_CONFIDENCE",
            Self::MissingPrincipal => "MISSING_PRINCIPAL",
            Self::UnknownPrincipal => "UNKNOWN_PRINCIPAL",
            Self::InvalidPrincipal => "INVALID_PRINCIPAL",
            Self::MissingGrant => "MISSING_GRANT",
            Self::ExpiredGrant => "EXPIRED_GRANT",
            Self::RevokedGrant => "REVOKED_GRANT",
            Self::ExhaustedGrant => "EXHAUSTED_GRANT",
            Self::InvalidGrantScope => "INVALID_GRANT_SCOPE",
            Self::UnknownCapability => "UNKNOWN_CAPABILITY",
            Self::CapabilityNotPermitted => "CAPABILITY_NOT_PERMITTED",
            Self::GuardRefusal => "GUARD_REFUSAL",
            Self::AuthorityUnavailable => "AUTHORITY_UNAVAILABLE",
            Self::FrictionRequired => "FRICTION_REQUIRED",
            Self::FrictionNotSatisfied => "FRICTION_NOT_SATISFIED",
            Self::SnapshotHashMismatch => "SNAPSHOT_HASH_MISMATCH",
            Self::SnapshotReuseAttempt => "SNAPSHOT_REUSE_ATTEMPT",
            Self::SnapshotExpired => "SNAPSHOT_EXPIRED",
            Self::ToctouViolation => "TOCTOU_VIOLATION",
            Self::CompositionStepFailure => "COMPOSITION_STEP_FAILURE",
            Self::CompositionHalted => "COMPOSITION_HALTED",
            Self::InvalidComposition => "INVALID_COMPOSITION",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::ExecutionTimeout => "EXECUTION_TIMEOUT",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a failure type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown failure type: {0}")]
pub struct UnknownFailureType(pub String);

impl FromStr for FailureType {
    type Err = UnknownFailureType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFailureType(s.to_string()))
    }
}
