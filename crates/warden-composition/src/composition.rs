//! Steps, failure policy and compositions
//!
//! All three are immutable value types. Fields are private and every
//! construction path, including deserialization, runs the same validation.

use crate::error::CompositionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use warden_authority::Context;

/// One capability invocation inside a composition
///
/// # Invariants
/// - `step_id` and `capability_name` are non-empty
/// - `order` equals the step's zero-based position in its composition
///   (checked by [`Composition::new`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStep")]
pub struct Step {
    step_id: String,
    capability_name: String,
    context: Context,
    order: usize,
}

impl Step {
    /// Create a validated step
    ///
    /// # Errors
    /// Returns error if `step_id` or `capability_name` is empty
    pub fn new(
        step_id: impl Into<String>,
        capability_name: impl Into<String>,
        context: Context,
        order: usize,
    ) -> Result<Self, CompositionError> {
        let step_id = step_id.into();
        let capability_name = capability_name.into();

        if step_id.trim().is_empty() {
            return Err(CompositionError::EmptyStepId { order });
        }
        if capability_name.trim().is_empty() {
            return Err(CompositionError::EmptyCapability { step_id });
        }

        Ok(Self {
            step_id,
            capability_name,
            context,
            order,
        })
    }

    /// Step identifier
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Capability to invoke
    #[inline]
    #[must_use]
    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }

    /// This step's own context; never shared with other steps
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Zero-based position
    #[inline]
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    step_id: String,
    capability_name: String,
    #[serde(default)]
    context: Context,
    order: usize,
}

impl TryFrom<RawStep> for Step {
    type Error = CompositionError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        Self::new(raw.step_id, raw.capability_name, raw.context, raw.order)
    }
}

/// How a composition reacts to a failed step
///
/// Closed: `Strict` is the only policy. The first refusal halts every
/// remaining step, with no retry and no branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePolicy {
    /// First refusal halts the composition
    #[default]
    Strict,
}

impl FailurePolicy {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "STRICT",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRICT" => Ok(Self::Strict),
            other => Err(CompositionError::UnsupportedPolicy(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FailurePolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, fixed sequence of independent steps under one failure policy
///
/// # Invariants
/// - at least one step
/// - step orders are exactly `0..n-1` in list order
/// - step ids are unique
/// - never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawComposition")]
pub struct Composition {
    composition_id: String,
    steps: Vec<Step>,
    failure_policy: FailurePolicy,
}

impl Composition {
    /// Create a validated composition
    ///
    /// # Errors
    /// Returns error if the id is empty, there are no steps, orders are not
    /// sequential from zero, or step ids repeat
    pub fn new(
        composition_id: impl Into<String>,
        steps: Vec<Step>,
        failure_policy: FailurePolicy,
    ) -> Result<Self, CompositionError> {
        let composition_id = composition_id.into();
        if composition_id.trim().is_empty() {
            return Err(CompositionError::EmptyCompositionId);
        }
        if steps.is_empty() {
            return Err(CompositionError::NoSteps);
        }

        let mut seen = HashSet::with_capacity(steps.len());
        for (position, step) in steps.iter().enumerate() {
            if step.order != position {
                return Err(CompositionError::NonSequentialOrder {
                    step_id: step.step_id.clone(),
                    position,
                    order: step.order,
                });
            }
            if !seen.insert(step.step_id.as_str()) {
                return Err(CompositionError::DuplicateStepId(step.step_id.clone()));
            }
        }

        Ok(Self {
            composition_id,
            steps,
            failure_policy,
        })
    }

    /// Build a STRICT composition from `(capability_name, context)` pairs
    ///
    /// Step ids are `{composition_id}.{order}` and orders follow list order.
    ///
    /// # Errors
    /// Returns error if the id is empty, the list is empty, or a capability
    /// name is empty
    pub fn from_capabilities<I, S>(
        composition_id: impl Into<String>,
        capabilities: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator<Item = (S, Context)>,
        S: Into<String>,
    {
        let composition_id = composition_id.into();
        let steps = capabilities
            .into_iter()
            .enumerate()
            .map(|(order, (capability, context))| {
                Step::new(format!("{composition_id}.{order}"), capability, context, order)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(composition_id, steps, FailurePolicy::Strict)
    }

    /// Composition identifier
    #[inline]
    #[must_use]
    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }

    /// Steps in execution order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Failure policy (always STRICT)
    #[inline]
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawComposition {
    composition_id: String,
    steps: Vec<Step>,
    failure_policy: String,
}

impl TryFrom<RawComposition> for Composition {
    type Error = CompositionError;

    fn try_from(raw: RawComposition) -> Result<Self, Self::Error> {
        let policy = raw.failure_policy.parse()?;
        Self::new(raw.composition_id, raw.steps, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(id: &str, order: usize) -> Step {
        Step::new(id, "files.read", Context::new(), order).unwrap()
    }

    #[test]
    fn step_rejects_empty_fields() {
        assert_eq!(
            Step::new("", "cap", Context::new(), 0),
            Err(CompositionError::EmptyStepId { order: 0 })
        );
        assert!(matches!(
            Step::new("s", " ", Context::new(), 0),
            Err(CompositionError::EmptyCapability { .. })
        ));
    }

    #[test]
    fn composition_valid() {
        let composition =
            Composition::new("c1", vec![step("a", 0), step("b", 1)], FailurePolicy::Strict)
                .unwrap();
        assert_eq!(composition.len(), 2);
        assert_eq!(composition.failure_policy(), FailurePolicy::Strict);
        assert_eq!(composition.steps()[1].step_id(), "b");
    }

    #[test]
    fn composition_rejects_zero_steps() {
        assert_eq!(
            Composition::new("c1", vec![], FailurePolicy::Strict),
            Err(CompositionError::NoSteps)
        );
    }

    #[test]
    fn composition_rejects_empty_id() {
        assert_eq!(
            Composition::new("", vec![step("a", 0)], FailurePolicy::Strict),
            Err(CompositionError::EmptyCompositionId)
        );
    }

    #[test]
    fn composition_rejects_gaps_and_swaps() {
        let gap = Composition::new("c", vec![step("a", 0), step("b", 2)], FailurePolicy::Strict);
        assert!(matches!(
            gap,
            Err(CompositionError::NonSequentialOrder { position: 1, order: 2, .. })
        ));

        let swapped =
            Composition::new("c", vec![step("a", 1), step("b", 0)], FailurePolicy::Strict);
        assert!(matches!(
            swapped,
            Err(CompositionError::NonSequentialOrder { position: 0, .. })
        ));

        let offset = Composition::new("c", vec![step("a", 1)], FailurePolicy::Strict);
        assert!(offset.is_err());
    }

    #[test]
    fn composition_rejects_duplicate_ids() {
        let result = Composition::new("c", vec![step("a", 0), step("a", 1)], FailurePolicy::Strict);
        assert_eq!(result, Err(CompositionError::DuplicateStepId("a".to_string())));
    }

    #[test]
    fn policy_parsing_is_closed() {
        assert_eq!("STRICT".parse::<FailurePolicy>(), Ok(FailurePolicy::Strict));
        assert_eq!(
            "BEST_EFFORT".parse::<FailurePolicy>(),
            Err(CompositionError::UnsupportedPolicy("BEST_EFFORT".to_string()))
        );
        assert!("strict".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn from_capabilities_assigns_orders() {
        let composition = Composition::from_capabilities(
            "plan",
            vec![("files.read", Context::new()), ("files.write", Context::new())],
        )
        .unwrap();
        assert_eq!(composition.steps()[0].step_id(), "plan.0");
        assert_eq!(composition.steps()[1].order(), 1);
        assert_eq!(composition.steps()[1].capability_name(), "files.write");
    }

    #[test]
    fn deserialization_validates() {
        let ok: Composition = serde_json::from_value(json!({
            "composition_id": "c",
            "steps": [{"step_id": "a", "capability_name": "x", "context": {"k": 1}, "order": 0}],
            "failure_policy": "STRICT"
        }))
        .unwrap();
        assert_eq!(ok.steps()[0].context()["k"], json!(1));

        let bad_policy: Result<Composition, _> = serde_json::from_value(json!({
            "composition_id": "c",
            "steps": [{"step_id": "a", "capability_name": "x", "order": 0}],
            "failure_policy": "LENIENT"
        }));
        assert!(bad_policy.is_err());

        let bad_order: Result<Composition, _> = serde_json::from_value(json!({
            "composition_id": "c",
            "steps": [{"step_id": "a", "capability_name": "x", "order": 3}],
            "failure_policy": "STRICT"
        }));
        assert!(bad_order.is_err());
    }

    #[test]
    fn serializes_policy_as_wire_name() {
        let composition = Composition::new("c", vec![step("a", 0)], FailurePolicy::Strict).unwrap();
        let value = serde_json::to_value(&composition).unwrap();
        assert_eq!(value["failure_policy"], json!("STRICT"));
        assert_eq!(value["steps"][0]["order"], json!(0));
    }
}
