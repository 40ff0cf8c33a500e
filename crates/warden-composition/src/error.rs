//! Construction errors for steps and compositions
//!
//! These are caller bugs and are raised immediately at construction.
//! Runtime refusals never appear here; they are data in
//! [`CompositionResult`](crate::CompositionResult).

/// Errors raised while constructing a [`Step`](crate::Step) or
/// [`Composition`](crate::Composition)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// Composition id is empty
    #[error("composition_id must be non-empty")]
    EmptyCompositionId,

    /// Composition has no steps
    #[error("composition must contain at least one step")]
    NoSteps,

    /// Step id is empty
    #[error("step at order {order} has an empty step_id")]
    EmptyStepId {
        /// Declared order of the offending step
        order: usize,
    },

    /// Capability name is empty
    #[error("step {step_id} has an empty capability_name")]
    EmptyCapability {
        /// Offending step
        step_id: String,
    },

    /// Step order does not match its list position
    #[error("step {step_id} at position {position} declares order {order}")]
    NonSequentialOrder {
        /// Offending step
        step_id: String,
        /// Zero-based position in the step list
        position: usize,
        /// Declared order
        order: usize,
    },

    /// Two steps share an id
    #[error("duplicate step_id: {0}")]
    DuplicateStepId(String),

    /// Failure policy other than STRICT requested
    #[error("unsupported failure policy '{0}': only STRICT is permitted")]
    UnsupportedPolicy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_sequential_display() {
        let err = CompositionError::NonSequentialOrder {
            step_id: "b".to_string(),
            position: 1,
            order: 3,
        };
        assert_eq!(err.to_string(), "step b at position 1 declares order 3");
    }

    #[test]
    fn unsupported_policy_display() {
        let err = CompositionError::UnsupportedPolicy("BEST_EFFORT".to_string());
        assert!(err.to_string().contains("only STRICT"));
    }
}
