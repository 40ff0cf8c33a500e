//! Warden Evidence
//!
//! Tamper-evident, independently verifiable evidence of guarded calls.
//!
//! # Core Concepts
//!
//! - Snapshots: context, intent, principal, grant and execution captures,
//!   each with an explicit canonical schema
//! - [`EvidenceBundle`]: sealed record whose `hash_chain_root` commits to
//!   every field; exactly one of `failure_composition` / `results`
//! - [`EvidenceGuard`]: produces one bundle per guarded call
//! - [`EvidenceExporter`]: stores bundles and exports canonical bytes
//! - [`verify_bytes`]: structure, hash and integrity checks over exported bytes
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_evidence::{EvidenceExporter, EvidenceGuard};
//!
//! let exporter = Arc::new(EvidenceExporter::new());
//! let guard = EvidenceGuard::new(authority, Arc::clone(&exporter));
//!
//! let bundle = guard.execute_with_evidence("files.read", &context, None, None)?;
//! let bytes = exporter.export_bundle(bundle.bundle_id())?;
//! assert!(exporter.verify_bundle(&bytes).is_valid);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bundle;
mod config;
mod error;
mod exporter;
mod guard;
mod snapshot;
mod verify;

pub use bundle::{bundle_chain, BundleParts, BundleResults, EvidenceBundle};
pub use config::EvidenceConfig;
pub use error::EvidenceError;
pub use exporter::EvidenceExporter;
pub use guard::EvidenceGuard;
pub use snapshot::{
    context_hash, ContextSnapshot, ExecutionSnapshot, GrantSnapshot, IntentSnapshot,
    PrincipalSnapshot,
};
pub use verify::{verify_bytes, VerificationResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
