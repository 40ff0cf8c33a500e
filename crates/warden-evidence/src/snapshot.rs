//! Point-in-time snapshots
//!
//! Every snapshot has an explicit canonical schema ([`ContextSnapshot::canonical_value`]
//! and friends). The chain hashes that schema and nothing else, so two
//! implementations agree on roots as long as they agree on these literals.
//! Optional fields are always present and `null` when absent.

use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use warden_authority::{Context, ExecutionOutcome, NonAction, Payload};
use warden_hash::ContentHash;

/// Map to a JSON object value
pub(crate) fn map_value(map: &Payload) -> Value {
    Value::Object(map.clone().into_iter().collect())
}

fn require(field: &'static str, value: &str) -> Result<(), EvidenceError> {
    if value.trim().is_empty() {
        Err(EvidenceError::EmptyField(field))
    } else {
        Ok(())
    }
}

fn require_time(field: &'static str, value: i64) -> Result<(), EvidenceError> {
    if value > 0 {
        Ok(())
    } else {
        Err(EvidenceError::InvalidTimestamp { field, value })
    }
}

/// Content hash of a context's canonical encoding
#[must_use]
pub fn context_hash(context: &Context) -> ContentHash {
    ContentHash::of_canonical(&map_value(context))
}

/// Execution context as handed to the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextSnapshot {
    context: Context,
    context_hash: ContentHash,
    captured_at: i64,
}

impl ContextSnapshot {
    /// Capture a context, hashing it
    #[must_use]
    pub fn capture(context: &Context, captured_at: i64) -> Self {
        Self {
            context: context.clone(),
            context_hash: context_hash(context),
            captured_at,
        }
    }

    /// Captured context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Hash of the captured context
    #[inline]
    #[must_use]
    pub fn context_hash(&self) -> &ContentHash {
        &self.context_hash
    }

    /// Capture time
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }

    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "context": map_value(&self.context),
            "context_hash": self.context_hash.to_hex(),
            "captured_at": self.captured_at,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), EvidenceError> {
        require_time("context_snapshot.captured_at", self.captured_at)
    }
}

/// The capability the caller declared it would invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentSnapshot {
    capability_name: String,
    step_id: Option<String>,
    declared_at: i64,
}

impl IntentSnapshot {
    /// Declare an intent
    #[must_use]
    pub fn declare(capability_name: &str, step_id: Option<&str>, declared_at: i64) -> Self {
        Self {
            capability_name: capability_name.to_string(),
            step_id: step_id.map(str::to_string),
            declared_at,
        }
    }

    /// Declared capability
    #[inline]
    #[must_use]
    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }

    /// Step id, if part of a composition
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> Option<&str> {
        self.step_id.as_deref()
    }

    /// Declaration time
    #[inline]
    #[must_use]
    pub fn declared_at(&self) -> i64 {
        self.declared_at
    }

    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "capability_name": self.capability_name,
            "step_id": self.step_id,
            "declared_at": self.declared_at,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), EvidenceError> {
        require("intent_snapshot.capability_name", &self.capability_name)?;
        require_time("intent_snapshot.declared_at", self.declared_at)
    }
}

/// Identity the call ran as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalSnapshot {
    principal_id: String,
    captured_at: i64,
}

impl PrincipalSnapshot {
    /// Principal recorded when the context carries none
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Capture the principal from `context[key]`, or [`Self::ANONYMOUS`]
    #[must_use]
    pub fn capture(context: &Context, key: &str, captured_at: i64) -> Self {
        let principal_id = match context.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Null | Value::String(_)) | None => Self::ANONYMOUS.to_string(),
            Some(other) => other.to_string(),
        };
        Self {
            principal_id,
            captured_at,
        }
    }

    /// Principal identifier
    #[inline]
    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// Capture time
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }

    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "principal_id": self.principal_id,
            "captured_at": self.captured_at,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), EvidenceError> {
        require("principal_snapshot.principal_id", &self.principal_id)?;
        require_time("principal_snapshot.captured_at", self.captured_at)
    }
}

/// Grant the call relied on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantSnapshot {
    grant_id: String,
    grant_data: Payload,
    captured_at: i64,
}

impl GrantSnapshot {
    /// Grant id recorded when neither the grant nor the context names one
    pub const UNIDENTIFIED: &'static str = "unidentified";

    /// Capture grant data; the id comes from `grant_data[key]`, then `context[key]`
    #[must_use]
    pub fn capture(grant_data: &Payload, context: &Context, key: &str, captured_at: i64) -> Self {
        let grant_id = [grant_data.get(key), context.get(key)]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| Self::UNIDENTIFIED.to_string());
        Self {
            grant_id,
            grant_data: grant_data.clone(),
            captured_at,
        }
    }

    /// Grant identifier
    #[inline]
    #[must_use]
    pub fn grant_id(&self) -> &str {
        &self.grant_id
    }

    /// Raw grant data
    #[inline]
    #[must_use]
    pub fn grant_data(&self) -> &Payload {
        &self.grant_data
    }

    /// Capture time
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }

    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "grant_id": self.grant_id,
            "grant_data": map_value(&self.grant_data),
            "captured_at": self.captured_at,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), EvidenceError> {
        require("grant_snapshot.grant_id", &self.grant_id)?;
        require_time("grant_snapshot.captured_at", self.captured_at)
    }
}

/// One execution attempt and its outcome
///
/// The outcome is a closed [`ExecutionOutcome`], so `result_data` and
/// `snapshot_id` are present iff `is_success` and `non_action` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExecutionSnapshot", into = "RawExecutionSnapshot")]
pub struct ExecutionSnapshot {
    step_id: Option<String>,
    capability_name: String,
    context_hash: ContentHash,
    executed_at: i64,
    outcome: ExecutionOutcome,
}

impl ExecutionSnapshot {
    /// Record an outcome
    #[must_use]
    pub fn record(
        capability_name: &str,
        step_id: Option<&str>,
        context_hash: ContentHash,
        executed_at: i64,
        outcome: ExecutionOutcome,
    ) -> Self {
        Self {
            step_id: step_id.map(str::to_string),
            capability_name: capability_name.to_string(),
            context_hash,
            executed_at,
            outcome,
        }
    }

    /// Record a successful execution
    #[must_use]
    pub fn succeeded(
        capability_name: &str,
        step_id: Option<&str>,
        context_hash: ContentHash,
        executed_at: i64,
        result_data: Payload,
        snapshot_id: impl Into<String>,
    ) -> Self {
        Self::record(
            capability_name,
            step_id,
            context_hash,
            executed_at,
            ExecutionOutcome::success(result_data, snapshot_id),
        )
    }

    /// Record a refused execution
    #[must_use]
    pub fn refused(
        capability_name: &str,
        step_id: Option<&str>,
        context_hash: ContentHash,
        executed_at: i64,
        non_action: NonAction,
    ) -> Self {
        Self::record(
            capability_name,
            step_id,
            context_hash,
            executed_at,
            ExecutionOutcome::refused(non_action),
        )
    }

    /// Step id
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> Option<&str> {
        self.step_id.as_deref()
    }

    /// Executed capability
    #[inline]
    #[must_use]
    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }

    /// Hash of the context the capability ran with
    #[inline]
    #[must_use]
    pub fn context_hash(&self) -> &ContentHash {
        &self.context_hash
    }

    /// Execution time
    #[inline]
    #[must_use]
    pub fn executed_at(&self) -> i64 {
        self.executed_at
    }

    /// Closed outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    /// Whether the capability executed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Authority snapshot id (success only)
    #[inline]
    #[must_use]
    pub fn snapshot_id(&self) -> Option<&str> {
        self.outcome.snapshot_id()
    }

    /// Result data (success only)
    #[inline]
    #[must_use]
    pub fn result_data(&self) -> Option<&Payload> {
        self.outcome.data()
    }

    /// Refusal (failure only)
    #[inline]
    #[must_use]
    pub fn non_action(&self) -> Option<&NonAction> {
        self.outcome.non_action()
    }

    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "step_id": self.step_id,
            "capability_name": self.capability_name,
            "context_hash": self.context_hash.to_hex(),
            "snapshot_id": self.snapshot_id(),
            "executed_at": self.executed_at,
            "is_success": self.is_success(),
            "result_data": self.result_data().map(map_value),
            "non_action": self.non_action().map(NonAction::to_value),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), EvidenceError> {
        require("execution_snapshot.capability_name", &self.capability_name)?;
        require_time("execution_snapshot.executed_at", self.executed_at)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExecutionSnapshot {
    step_id: Option<String>,
    capability_name: String,
    context_hash: ContentHash,
    snapshot_id: Option<String>,
    executed_at: i64,
    is_success: bool,
    result_data: Option<Payload>,
    non_action: Option<NonAction>,
}

impl TryFrom<RawExecutionSnapshot> for ExecutionSnapshot {
    type Error = EvidenceError;

    fn try_from(raw: RawExecutionSnapshot) -> Result<Self, Self::Error> {
        let outcome = match (raw.is_success, raw.result_data, raw.snapshot_id, raw.non_action) {
            (true, Some(data), Some(snapshot_id), None) => ExecutionOutcome::success(data, snapshot_id),
            (false, None, None, Some(non_action)) => ExecutionOutcome::refused(non_action),
            (true, ..) => {
                return Err(EvidenceError::InconsistentExecution(
                    "success requires result_data and snapshot_id and no non_action".to_string(),
                ))
            }
            (false, ..) => {
                return Err(EvidenceError::InconsistentExecution(
                    "refusal requires non_action and no result_data or snapshot_id".to_string(),
                ))
            }
        };
        Ok(Self {
            step_id: raw.step_id,
            capability_name: raw.capability_name,
            context_hash: raw.context_hash,
            executed_at: raw.executed_at,
            outcome,
        })
    }
}

impl From<ExecutionSnapshot> for RawExecutionSnapshot {
    fn from(snapshot: ExecutionSnapshot) -> Self {
        let is_success = snapshot.is_success();
        let (result_data, snapshot_id, non_action) = match snapshot.outcome {
            ExecutionOutcome::Success { data, snapshot_id } => (Some(data), Some(snapshot_id), None),
            ExecutionOutcome::Refused { non_action } => (None, None, Some(non_action)),
        };
        Self {
            step_id: snapshot.step_id,
            capability_name: snapshot.capability_name,
            context_hash: snapshot.context_hash,
            snapshot_id,
            executed_at: snapshot.executed_at,
            is_success,
            result_data,
            non_action,
        }
    }
}
