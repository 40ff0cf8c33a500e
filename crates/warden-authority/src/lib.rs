//! Warden Authority Contract
//!
//! The Authority Guard is the single external decision point the accountability
//! layer wraps. It accepts a capability name and a context and either performs
//! the capability or returns a structured refusal (a *non-action*).
//!
//! # Core Concepts
//!
//! - [`AuthorityGuard`]: the synchronous `execute(capability_name, context)` contract
//! - [`ExecutionOutcome`]: closed success/refusal result of one call
//! - [`NonAction`]: structured refusal payload
//! - [`call_fail_closed`]: converts a raised [`AuthorityError`] into a synthetic
//!   `EXECUTION_ERROR` refusal so callers only ever see data
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_authority::{call_fail_closed, AuthorityGuard, Context};
//!
//! let outcome = call_fail_closed(&guard, "files.read", &Context::new());
//! if let Some(non_action) = outcome.non_action() {
//!     println!("refused: {}", non_action.reason);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod guard;
mod outcome;
pub mod reasons;

pub use error::AuthorityError;
pub use guard::{call_fail_closed, call_guard, AuthorityGuard, FnAuthorityGuard};
pub use outcome::{Context, ExecutionOutcome, NonAction, Payload};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wall-clock milliseconds since the Unix epoch.
///
/// Every `timestamp` and `*_at` value in the workspace uses this unit.
#[inline]
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
