//! Authority Guard call outcomes
//!
//! The wire contract is `{is_success, data?, snapshot_id?, non_action?}` with
//! `data`/`snapshot_id` present iff success and `non_action` present iff
//! refusal. [`ExecutionOutcome`] is a closed sum so no other combination can
//! be constructed; serde goes through [`RawOutcome`] to keep the wire shape.

use crate::error::AuthorityError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Execution context handed to the Authority Guard (sorted keys)
pub type Context = BTreeMap<String, Value>;

/// Structured data map (result data, refusal details)
pub type Payload = BTreeMap<String, Value>;

/// Structured refusal returned instead of performing a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonAction {
    /// Machine-readable refusal reason (e.g. `NO_GRANT`)
    pub reason: String,
    /// Structured refusal details
    #[serde(default)]
    pub details: Payload,
    /// Refusal time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl NonAction {
    /// Create a refusal with empty details
    #[inline]
    pub fn new(reason: impl Into<String>, timestamp: i64) -> Self {
        Self {
            reason: reason.into(),
            details: Payload::new(),
            timestamp,
        }
    }

    /// Add a detail entry
    #[inline]
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Canonical JSON value of this refusal
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "reason": self.reason,
            "details": Value::Object(self.details.clone().into_iter().collect()),
            "timestamp": self.timestamp,
        })
    }
}

/// Result of one Authority Guard call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome", into = "RawOutcome")]
pub enum ExecutionOutcome {
    /// Capability was permitted and executed
    Success {
        /// Capability result data
        data: Payload,
        /// Authority snapshot the execution was bound to
        snapshot_id: String,
    },
    /// Capability was refused
    Refused {
        /// Refusal payload
        non_action: NonAction,
    },
}

impl ExecutionOutcome {
    /// Create a success outcome
    #[inline]
    pub fn success(data: Payload, snapshot_id: impl Into<String>) -> Self {
        Self::Success {
            data,
            snapshot_id: snapshot_id.into(),
        }
    }

    /// Create a refusal outcome
    #[inline]
    #[must_use]
    pub fn refused(non_action: NonAction) -> Self {
        Self::Refused { non_action }
    }

    /// Whether the capability executed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Result data, present iff success
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Payload> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Refused { .. } => None,
        }
    }

    /// Snapshot id, present iff success
    #[inline]
    #[must_use]
    pub fn snapshot_id(&self) -> Option<&str> {
        match self {
            Self::Success { snapshot_id, .. } => Some(snapshot_id),
            Self::Refused { .. } => None,
        }
    }

    /// Refusal payload, present iff refused
    #[inline]
    #[must_use]
    pub fn non_action(&self) -> Option<&NonAction> {
        match self {
            Self::Success { .. } => None,
            Self::Refused { non_action } => Some(non_action),
        }
    }
}

/// Wire shape of [`ExecutionOutcome`]
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutcome {
    is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    non_action: Option<NonAction>,
}

impl TryFrom<RawOutcome> for ExecutionOutcome {
    type Error = AuthorityError;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        match (raw.is_success, raw.data, raw.snapshot_id, raw.non_action) {
            (true, Some(data), Some(snapshot_id), None) => Ok(Self::Success { data, snapshot_id }),
            (false, None, None, Some(non_action)) => Ok(Self::Refused { non_action }),
            (true, ..) => Err(AuthorityError::MalformedOutcome(
                "success requires data and snapshot_id and forbids non_action".to_string(),
            )),
            (false, ..) => Err(AuthorityError::MalformedOutcome(
                "refusal requires non_action and forbids data and snapshot_id".to_string(),
            )),
        }
    }
}

impl From<ExecutionOutcome> for RawOutcome {
    fn from(outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Success { data, snapshot_id } => Self {
                is_success: true,
                data: Some(data),
                snapshot_id: Some(snapshot_id),
                non_action: None,
            },
            ExecutionOutcome::Refused { non_action } => Self {
                is_success: false,
                data: None,
                snapshot_id: None,
                non_action: Some(non_action),
            },
        }
    }
}
