//! The Authority Guard contract
//!
//! One synchronous operation. There is no suspension point: a call either
//! returns an outcome or raises an [`AuthorityError`].

use crate::error::AuthorityError;
use crate::outcome::{Context, ExecutionOutcome, NonAction};
use crate::{now_millis, reasons};

/// External decision point for capability execution
///
/// Implementations decide authorization policy; the accountability layer
/// only calls through this contract and records what happened.
pub trait AuthorityGuard: Send + Sync {
    /// Execute `capability_name` with `context`, or refuse
    ///
    /// # Errors
    /// Returns error if the authority or the capability raised instead of
    /// producing an outcome.
    fn execute(
        &self,
        capability_name: &str,
        context: &Context,
    ) -> Result<ExecutionOutcome, AuthorityError>;
}

/// Adapter turning a closure into an [`AuthorityGuard`]
pub struct FnAuthorityGuard<F> {
    inner: F,
}

impl<F> FnAuthorityGuard<F>
where
    F: Fn(&str, &Context) -> Result<ExecutionOutcome, AuthorityError> + Send + Sync,
{
    /// Wrap a closure
    #[inline]
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F> std::fmt::Debug for FnAuthorityGuard<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAuthorityGuard").finish_non_exhaustive()
    }
}

impl<F> AuthorityGuard for FnAuthorityGuard<F>
where
    F: Fn(&str, &Context) -> Result<ExecutionOutcome, AuthorityError> + Send + Sync,
{
    fn execute(
        &self,
        capability_name: &str,
        context: &Context,
    ) -> Result<ExecutionOutcome, AuthorityError> {
        (self.inner)(capability_name, context)
    }
}

/// Call the guard, keeping a raised error visible
///
/// # Errors
/// Returns the guard's error unchanged.
pub fn call_guard(
    guard: &dyn AuthorityGuard,
    capability_name: &str,
    context: &Context,
) -> Result<ExecutionOutcome, AuthorityError> {
    tracing::trace!(capability = capability_name, "dispatching to authority guard");
    guard.execute(capability_name, context)
}

/// Call the guard, converting a raised error into a synthetic refusal
///
/// The refusal carries `reason = EXECUTION_ERROR` and the error text under
/// `details.error`.
#[must_use]
pub fn call_fail_closed(
    guard: &dyn AuthorityGuard,
    capability_name: &str,
    context: &Context,
) -> ExecutionOutcome {
    match call_guard(guard, capability_name, context) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(
                capability = capability_name,
                error = %err,
                "authority guard raised; recording EXECUTION_ERROR refusal"
            );
            ExecutionOutcome::refused(
                NonAction::new(reasons::EXECUTION_ERROR, now_millis())
                    .with_detail("error", err.to_string()),
            )
        }
    }
}
