//! Well-known refusal reason strings
//!
//! These are the reasons an Authority Guard is expected to emit. The set is
//! open on the wire; interpretation into a closed taxonomy happens in the
//! failure layer.

/// Synthetic reason for a call that raised instead of returning an outcome
pub const EXECUTION_ERROR: &str = "EXECUTION_ERROR";
/// Confidence value missing from context
pub const MISSING_CONFIDENCE: &str = "MISSING_CONFIDENCE";
/// Confidence value malformed or out of range
pub const INVALID_CONFIDENCE: &str = "INVALID_CONFIDENCE";
/// Principal missing from context
pub const MISSING_PRINCIPAL: &str = "MISSING_PRINCIPAL";
/// Principal not registered with the authority
pub const UNKNOWN_PRINCIPAL: &str = "UNKNOWN_PRINCIPAL";
/// No grant covers the requested capability
pub const NO_GRANT: &str = "NO_GRANT";
/// Grant past its expiry
pub const EXPIRED_GRANT: &str = "EXPIRED_GRANT";
/// Grant revoked
pub const REVOKED_GRANT: &str = "REVOKED_GRANT";
/// Grant usage budget exhausted
pub const EXHAUSTED_GRANT: &str = "EXHAUSTED_GRANT";
/// Capability not registered
pub const UNKNOWN_CAPABILITY: &str = "UNKNOWN_CAPABILITY";
/// Grant does not cover the requested scope
pub const INVALID_GRANT_SCOPE: &str = "INVALID_GRANT_SCOPE";
/// Authority snapshot content hash did not match
pub const SNAPSHOT_HASH_MISMATCH: &str = "SNAPSHOT_HASH_MISMATCH";
/// A single-use snapshot was presented twice
pub const SNAPSHOT_REUSE_ATTEMPT: &str = "SNAPSHOT_REUSE_ATTEMPT";
/// State changed between check and use
pub const TOCTOU_VIOLATION: &str = "TOCTOU_VIOLATION";
/// A composed step failed
pub const COMPOSITION_STEP_FAILURE: &str = "COMPOSITION_STEP_FAILURE";
