//! Failure layer errors
//!
//! Construction errors for malformed events, compositions and results, plus
//! the query error for reading an empty accumulator.

/// Errors raised by failure types and the [`FailureGuard`](crate::FailureGuard)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureError {
    /// `failure_id` is empty
    #[error("failure_id must be non-empty")]
    EmptyFailureId,

    /// `triggering_condition` is empty
    #[error("triggering_condition must be non-empty")]
    EmptyTriggeringCondition,

    /// `timestamp` is not a positive epoch value
    #[error("timestamp must be positive, got {0}")]
    InvalidTimestamp(i64),

    /// `composition_id` is empty
    #[error("composition_id must be non-empty")]
    EmptyCompositionId,

    /// A failure list is empty
    #[error("failures must be non-empty")]
    NoFailures,

    /// Failures are not in non-decreasing timestamp order
    #[error("failure {index} at {timestamp} precedes previous failure at {previous}")]
    OutOfOrder {
        /// Index of the offending failure
        index: usize,
        /// Its timestamp
        timestamp: i64,
        /// Timestamp of the failure before it
        previous: i64,
    },

    /// A failure result was built with `terminal = false`
    #[error("failure result must be terminal")]
    NonTerminal,

    /// Queried failures from a guard that has recorded none
    #[error("no failures recorded")]
    NoFailuresRecorded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_display() {
        let err = FailureError::OutOfOrder {
            index: 2,
            timestamp: 5,
            previous: 9,
        };
        assert_eq!(
            err.to_string(),
            "failure 2 at 5 precedes previous failure at 9"
        );
    }
}
