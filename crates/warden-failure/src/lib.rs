//! Warden Failure Guard
//!
//! Turns refusals and raised errors from the Authority Guard into structured,
//! closed-taxonomy failure records and accumulates them per guard instance.
//!
//! # Core Concepts
//!
//! - [`FailureType`]: closed taxonomy, with [`FailureType::from_reason`]
//!   mapping refusal reasons
//! - [`FailureEvent`]: one immutable failure record
//! - [`FailureComposition`] / [`FailureResult`]: ordered, non-empty failure
//!   collections
//! - [`FailureGuard`]: records failures until explicitly cleared
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_failure::{FailureGuard, FailurePhase};
//!
//! let guard = FailureGuard::new(authority);
//! let outcome = guard.execute_with_failure_tracking(
//!     "payments.send",
//!     &context,
//!     FailurePhase::Authorization,
//!     None,
//! );
//! if guard.has_failures() {
//!     let result = guard.get_failure_result(Some("checkout"))?;
//!     guard.clear_failures();
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod composition;
mod error;
mod event;
mod failure_type;
mod guard;

pub use composition::{FailureComposition, FailureResult};
pub use error::FailureError;
pub use event::{AuthorityContext, FailureEvent, FailurePhase};
pub use failure_type::{FailureSubject, FailureType, UnknownFailureType};
pub use guard::{
    FailureEnvelope, FailureGuard, TrackedOutcome, GRANT_ID_KEY, PRINCIPAL_ID_KEY,
    SNAPSHOT_ID_KEY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
