//! Ordered failure collections
//!
//! [`FailureComposition`] and [`FailureResult`] carry failures exactly as they
//! occurred. Neither type has a derived field (no root cause, severity or
//! success data), and neither can be empty.

use crate::error::FailureError;
use crate::event::FailureEvent;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

fn check_ordered(failures: &[FailureEvent]) -> Result<(), FailureError> {
    if failures.is_empty() {
        return Err(FailureError::NoFailures);
    }
    for (index, pair) in failures.windows(2).enumerate() {
        if pair[1].timestamp() < pair[0].timestamp() {
            return Err(FailureError::OutOfOrder {
                index: index + 1,
                timestamp: pair[1].timestamp(),
                previous: pair[0].timestamp(),
            });
        }
    }
    Ok(())
}

/// Failures of one logical unit of work, in order of occurrence
///
/// # Invariants
/// - `failures` is non-empty
/// - timestamps are non-decreasing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFailureComposition")]
pub struct FailureComposition {
    composition_id: String,
    failures: Vec<FailureEvent>,
}

impl FailureComposition {
    /// Create a validated composition
    ///
    /// # Errors
    /// Returns error if `composition_id` is empty, `failures` is empty, or
    /// failures are out of timestamp order
    pub fn new(
        composition_id: impl Into<String>,
        failures: Vec<FailureEvent>,
    ) -> Result<Self, FailureError> {
        let composition_id = composition_id.into();
        if composition_id.trim().is_empty() {
            return Err(FailureError::EmptyCompositionId);
        }
        check_ordered(&failures)?;
        Ok(Self {
            composition_id,
            failures,
        })
    }

    /// Composition identifier
    #[inline]
    #[must_use]
    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }

    /// Failures in order of occurrence
    #[inline]
    #[must_use]
    pub fn failures(&self) -> &[FailureEvent] {
        &self.failures
    }

    /// Number of failures (always at least one)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always false; kept for API symmetry with collections
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFailureComposition {
    composition_id: String,
    failures: Vec<FailureEvent>,
}

impl TryFrom<RawFailureComposition> for FailureComposition {
    type Error = FailureError;

    fn try_from(raw: RawFailureComposition) -> Result<Self, Self::Error> {
        Self::new(raw.composition_id, raw.failures)
    }
}

/// Terminal failure result
///
/// `terminal` is always true and is not stored; constructing with
/// `terminal = false` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFailureResult")]
pub struct FailureResult {
    composition_id: Option<String>,
    failures: Vec<FailureEvent>,
}

impl FailureResult {
    /// Create a validated terminal result
    ///
    /// # Errors
    /// Returns error if `terminal` is false, `failures` is empty, or failures
    /// are out of timestamp order
    pub fn new(
        composition_id: Option<String>,
        failures: Vec<FailureEvent>,
        terminal: bool,
    ) -> Result<Self, FailureError> {
        if !terminal {
            return Err(FailureError::NonTerminal);
        }
        check_ordered(&failures)?;
        Ok(Self {
            composition_id,
            failures,
        })
    }

    /// Terminal result covering a whole composition
    #[must_use]
    pub fn from_composition(composition: FailureComposition) -> Self {
        Self {
            composition_id: Some(composition.composition_id),
            failures: composition.failures,
        }
    }

    /// Composition identifier, if scoped to one
    #[inline]
    #[must_use]
    pub fn composition_id(&self) -> Option<&str> {
        self.composition_id.as_deref()
    }

    /// Failures in order of occurrence
    #[inline]
    #[must_use]
    pub fn failures(&self) -> &[FailureEvent] {
        &self.failures
    }

    /// Always true
    #[inline]
    #[must_use]
    pub fn terminal(&self) -> bool {
        true
    }
}

impl Serialize for FailureResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FailureResult", 3)?;
        state.serialize_field("composition_id", &self.composition_id)?;
        state.serialize_field("failures", &self.failures)?;
        state.serialize_field("terminal", &true)?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFailureResult {
    #[serde(default)]
    composition_id: Option<String>,
    failures: Vec<FailureEvent>,
    terminal: bool,
}

impl TryFrom<RawFailureResult> for FailureResult {
    type Error = FailureError;

    fn try_from(raw: RawFailureResult) -> Result<Self, Self::Error> {
        Self::new(raw.composition_id, raw.failures, raw.terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FailurePhase;
    use crate::failure_type::FailureType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(id: &str, timestamp: i64) -> FailureEvent {
        FailureEvent::new(
            id,
            FailurePhase::Execution,
            FailureType::GuardRefusal,
            "Non-Action reason: X",
            timestamp,
        )
        .unwrap()
    }

    #[test]
    fn composition_requires_failures() {
        assert_eq!(
            FailureComposition::new("c", vec![]),
            Err(FailureError::NoFailures)
        );
        assert_eq!(
            FailureComposition::new("", vec![at("a", 1)]),
            Err(FailureError::EmptyCompositionId)
        );
    }

    #[test]
    fn composition_rejects_out_of_order() {
        let err = FailureComposition::new("c", vec![at("a", 5), at("b", 5), at("c", 4)]).unwrap_err();
        assert_eq!(
            err,
            FailureError::OutOfOrder {
                index: 2,
                timestamp: 4,
                previous: 5
            }
        );
    }

    #[test]
    fn composition_keeps_duplicates_in_order() {
        let composition = FailureComposition::new("c", vec![at("a", 1), at("a", 1)]).unwrap();
        assert_eq!(composition.len(), 2);
        assert_eq!(composition.failures()[0], composition.failures()[1]);
    }

    #[test]
    fn result_rejects_non_terminal_and_empty() {
        assert_eq!(
            FailureResult::new(None, vec![at("a", 1)], false),
            Err(FailureError::NonTerminal)
        );
        assert_eq!(
            FailureResult::new(Some("c".to_string()), vec![], false),
            Err(FailureError::NonTerminal)
        );
        assert_eq!(
            FailureResult::new(None, vec![], true),
            Err(FailureError::NoFailures)
        );
    }

    #[test]
    fn result_has_no_success_shape() {
        let result = FailureResult::new(None, vec![at("a", 1)], true).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["terminal"], json!(true));
        assert!(value.get("data").is_none());
        assert!(value.get("final_data").is_none());
        assert!(value.get("output").is_none());
    }

    #[test]
    fn deserialization_validates() {
        let good = json!({
            "composition_id": "c",
            "failures": [serde_json::to_value(at("a", 3)).unwrap()],
            "terminal": true
        });
        let parsed: FailureResult = serde_json::from_value(good.clone()).unwrap();
        assert_eq!(parsed.composition_id(), Some("c"));

        let mut bad = good;
        bad["terminal"] = json!(false);
        assert!(serde_json::from_value::<FailureResult>(bad).is_err());

        let composition: Result<FailureComposition, _> =
            serde_json::from_value(json!({"composition_id": "c", "failures": []}));
        assert!(composition.is_err());
    }

    #[test]
    fn result_from_composition() {
        let composition = FailureComposition::new("c", vec![at("a", 1), at("b", 2)]).unwrap();
        let result = FailureResult::from_composition(composition);
        assert_eq!(result.composition_id(), Some("c"));
        assert_eq!(result.failures().len(), 2);
        assert!(result.terminal());
    }
}
