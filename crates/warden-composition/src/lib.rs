//! Warden Composition Guard
//!
//! Mechanical multi-step composition with fail-closed semantics.
//!
//! # Core Concepts
//!
//! - [`Step`]: one capability invocation with its own context
//! - [`Composition`]: validated, immutable, ordered list of steps
//! - [`FailurePolicy`]: closed; `Strict` is the only policy
//! - [`CompositionGuard`]: runs steps through the Authority Guard, halting
//!   on the first refusal
//! - [`CompositionResult`]: completed with `final_data`, or halted with
//!   `halted_at_step` and the refusal
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_composition::{Composition, CompositionGuard};
//!
//! let composition = Composition::from_capabilities("deploy", [
//!     ("repo.checkout", ctx_a),
//!     ("build.run", ctx_b),
//!     ("release.publish", ctx_c),
//! ])?;
//!
//! let guard = CompositionGuard::new(authority);
//! let result = guard.execute_composition(&composition);
//! if let Some(step) = result.halted_at_step() {
//!     println!("halted at {step}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod composition;
mod error;
mod guard;
mod result;

pub use composition::{Composition, FailurePolicy, Step};
pub use error::CompositionError;
pub use guard::{CompositionGuard, CompositionState};
pub use result::{CompositionOutcome, CompositionResult, StepOutcome, StepResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
