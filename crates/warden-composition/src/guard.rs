//! Composition Guard
//!
//! Sequences a composition's steps through the Authority Guard under the
//! STRICT policy. Each composition run is a two-state machine:
//! `Running → Completed` or `Running → Halted`, with no further transitions.
//!
//! # Critical Invariant
//!
//! The guard never retries, never reorders, never branches on a failure and
//! never shares state between steps. A refusal halts the run before any
//! later step is dispatched.

use crate::composition::{Composition, FailurePolicy, Step};
use crate::result::{CompositionResult, StepOutcome, StepResult};
use std::sync::Arc;
use warden_authority::{call_fail_closed, AuthorityGuard, ExecutionOutcome, NonAction, Payload};

/// Lifecycle state of one composition run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionState {
    /// Steps are being dispatched
    Running,
    /// Every step succeeded
    Completed,
    /// A step failed and the run stopped
    Halted,
}

impl CompositionState {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// In-flight run of one composition
struct Run<'a> {
    composition: &'a Composition,
    state: CompositionState,
    executed: Vec<StepResult>,
    last_data: Option<Payload>,
    halt: Option<(NonAction, String)>,
}

impl<'a> Run<'a> {
    fn new(composition: &'a Composition) -> Self {
        Self {
            composition,
            state: CompositionState::Running,
            executed: Vec::with_capacity(composition.len()),
            last_data: None,
            halt: None,
        }
    }

    /// Record a step outcome and return the resulting state
    fn record(&mut self, step: &Step, outcome: ExecutionOutcome) -> CompositionState {
        debug_assert_eq!(self.state, CompositionState::Running);

        match outcome {
            ExecutionOutcome::Success { data, snapshot_id } => {
                self.last_data = Some(data.clone());
                self.executed.push(StepResult::new(
                    step.step_id(),
                    step.order(),
                    StepOutcome::Succeeded { data, snapshot_id },
                ));
            }
            ExecutionOutcome::Refused { non_action } => {
                self.executed.push(StepResult::new(
                    step.step_id(),
                    step.order(),
                    StepOutcome::Failed {
                        non_action: non_action.clone(),
                    },
                ));
                self.halt = Some((non_action, step.step_id().to_string()));
                self.state = CompositionState::Halted;
            }
        }
        self.state
    }

    /// Close the run, returning its terminal state and result
    fn finish(self) -> (CompositionState, CompositionResult) {
        let composition = self.composition;
        let composition_id = composition.composition_id();
        match self.halt {
            Some((non_action, halted_at_step)) => (
                CompositionState::Halted,
                CompositionResult::halted(composition_id, self.executed, non_action, halted_at_step),
            ),
            None => (
                CompositionState::Completed,
                CompositionResult::completed(
                    composition_id,
                    self.executed,
                    self.last_data.unwrap_or_default(),
                ),
            ),
        }
    }
}

/// Fail-closed executor for compositions
///
/// Holds only the Authority Guard; it keeps no state between compositions
/// and may be shared across threads.
#[derive(Clone)]
pub struct CompositionGuard {
    authority: Arc<dyn AuthorityGuard>,
}

impl std::fmt::Debug for CompositionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionGuard").finish_non_exhaustive()
    }
}

impl CompositionGuard {
    /// Create a guard delegating to `authority`
    #[inline]
    #[must_use]
    pub fn new(authority: Arc<dyn AuthorityGuard>) -> Self {
        Self { authority }
    }

    /// Execute every step in order, halting on the first refusal
    ///
    /// Refusals and raised authority errors are returned as data in the
    /// result; this never fails.
    #[must_use]
    pub fn execute_composition(&self, composition: &Composition) -> CompositionResult {
        // STRICT is the only policy; a new variant must revisit the halt rule below.
        let FailurePolicy::Strict = composition.failure_policy();

        let span = tracing::info_span!(
            "composition",
            composition_id = composition.composition_id(),
            steps = composition.len()
        );
        let _enter = span.enter();

        let mut run = Run::new(composition);
        for step in composition.steps() {
            tracing::debug!(
                step_id = step.step_id(),
                order = step.order(),
                capability = step.capability_name(),
                "dispatching step"
            );

            let outcome =
                call_fail_closed(self.authority.as_ref(), step.capability_name(), step.context());

            if run.record(step, outcome) == CompositionState::Halted {
                let reason = run
                    .halt
                    .as_ref()
                    .map_or("", |(non_action, _)| non_action.reason.as_str());
                tracing::warn!(
                    step_id = step.step_id(),
                    order = step.order(),
                    reason,
                    "composition halted"
                );
                break;
            }
        }

        let (state, result) = run.finish();
        debug_assert!(state.is_terminal());
        tracing::info!(?state, steps = result.steps().len(), "composition finished");
        result
    }
}
