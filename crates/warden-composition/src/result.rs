//! Per-step and per-composition results
//!
//! Both results are closed sums internally so a step can never carry success
//! data and a refusal at once, and a composition is either completed or
//! halted. The serialized form is the flat wire shape downstream renderers
//! expect (`is_success`, optional fields).

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use warden_authority::{NonAction, Payload};

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Authority permitted and executed the capability
    Succeeded {
        /// Capability result data
        data: Payload,
        /// Authority snapshot id
        snapshot_id: String,
    },
    /// Authority refused, or raised and was mapped to `EXECUTION_ERROR`
    Failed {
        /// Refusal payload
        non_action: NonAction,
    },
}

/// Record of one executed step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    step_id: String,
    order: usize,
    outcome: StepOutcome,
}

impl StepResult {
    pub(crate) fn new(step_id: impl Into<String>, order: usize, outcome: StepOutcome) -> Self {
        Self {
            step_id: step_id.into(),
            order,
            outcome,
        }
    }

    /// Step identifier
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Step position
    #[inline]
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Closed outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &StepOutcome {
        &self.outcome
    }

    /// Whether the step executed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded { .. })
    }

    /// Result data (success only)
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Payload> {
        match &self.outcome {
            StepOutcome::Succeeded { data, .. } => Some(data),
            StepOutcome::Failed { .. } => None,
        }
    }

    /// Snapshot id (success only)
    #[inline]
    #[must_use]
    pub fn snapshot_id(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Succeeded { snapshot_id, .. } => Some(snapshot_id),
            StepOutcome::Failed { .. } => None,
        }
    }

    /// Refusal (failure only)
    #[inline]
    #[must_use]
    pub fn non_action(&self) -> Option<&NonAction> {
        match &self.outcome {
            StepOutcome::Succeeded { .. } => None,
            StepOutcome::Failed { non_action } => Some(non_action),
        }
    }
}

impl Serialize for StepResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StepResult", 5)?;
        state.serialize_field("step_id", &self.step_id)?;
        state.serialize_field("order", &self.order)?;
        state.serialize_field("is_success", &self.is_success())?;
        match &self.outcome {
            StepOutcome::Succeeded { data, snapshot_id } => {
                state.serialize_field("data", data)?;
                state.serialize_field("snapshot_id", snapshot_id)?;
            }
            StepOutcome::Failed { non_action } => {
                state.serialize_field("non_action", non_action)?;
            }
        }
        state.end()
    }
}

/// Terminal state of a composition
#[derive(Debug, Clone, PartialEq)]
pub enum CompositionOutcome {
    /// Every step succeeded
    Completed {
        /// Data of the last step
        final_data: Payload,
    },
    /// First refusal halted the composition
    Halted {
        /// Refusal of the failing step
        non_action: NonAction,
        /// Id of the failing step
        halted_at_step: String,
    },
}

/// Result of executing a composition
///
/// # Invariants
/// - completed: `steps` holds every step, all successful
/// - halted: `steps` ends at the failing step, which is the only failure
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionResult {
    composition_id: String,
    steps: Vec<StepResult>,
    outcome: CompositionOutcome,
}

impl CompositionResult {
    pub(crate) fn completed(
        composition_id: impl Into<String>,
        steps: Vec<StepResult>,
        final_data: Payload,
    ) -> Self {
        Self {
            composition_id: composition_id.into(),
            steps,
            outcome: CompositionOutcome::Completed { final_data },
        }
    }

    pub(crate) fn halted(
        composition_id: impl Into<String>,
        steps: Vec<StepResult>,
        non_action: NonAction,
        halted_at_step: impl Into<String>,
    ) -> Self {
        Self {
            composition_id: composition_id.into(),
            steps,
            outcome: CompositionOutcome::Halted {
                non_action,
                halted_at_step: halted_at_step.into(),
            },
        }
    }

    /// Composition identifier
    #[inline]
    #[must_use]
    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }

    /// Executed steps, truncated at the halting step
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Closed outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &CompositionOutcome {
        &self.outcome
    }

    /// Whether every step succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CompositionOutcome::Completed { .. })
    }

    /// Last step's data (completed only)
    #[inline]
    #[must_use]
    pub fn final_data(&self) -> Option<&Payload> {
        match &self.outcome {
            CompositionOutcome::Completed { final_data } => Some(final_data),
            CompositionOutcome::Halted { .. } => None,
        }
    }

    /// Refusal that halted the composition
    #[inline]
    #[must_use]
    pub fn non_action(&self) -> Option<&NonAction> {
        match &self.outcome {
            CompositionOutcome::Completed { .. } => None,
            CompositionOutcome::Halted { non_action, .. } => Some(non_action),
        }
    }

    /// Id of the step that halted the composition
    #[inline]
    #[must_use]
    pub fn halted_at_step(&self) -> Option<&str> {
        match &self.outcome {
            CompositionOutcome::Completed { .. } => None,
            CompositionOutcome::Halted { halted_at_step, .. } => Some(halted_at_step),
        }
    }
}

impl Serialize for CompositionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompositionResult", 5)?;
        state.serialize_field("composition_id", &self.composition_id)?;
        state.serialize_field("is_success", &self.is_success())?;
        state.serialize_field("steps", &self.steps)?;
        match &self.outcome {
            CompositionOutcome::Completed { final_data } => {
                state.serialize_field("final_data", final_data)?;
            }
            CompositionOutcome::Halted {
                non_action,
                halted_at_step,
            } => {
                state.serialize_field("non_action", non_action)?;
                state.serialize_field("halted_at_step", halted_at_step)?;
            }
        }
        state.end()
    }
}
