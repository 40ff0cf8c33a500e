//! Errors raised by an Authority Guard call

/// Error raised by an [`AuthorityGuard`](crate::AuthorityGuard) instead of an outcome
///
/// The accountability layer never propagates these to its own callers; they
/// are converted into `EXECUTION_ERROR` refusals or failure events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    /// The authority could not be reached or is not initialized
    #[error("authority unavailable: {0}")]
    Unavailable(String),

    /// The capability itself raised while executing
    #[error("capability raised: {0}")]
    Raised(String),

    /// The authority returned an outcome that violates the contract shape
    #[error("malformed outcome: {0}")]
    MalformedOutcome(String),
}

impl AuthorityError {
    /// Create a [`AuthorityError::Raised`] error
    #[inline]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }

    /// Create a [`AuthorityError::Unavailable`] error
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
