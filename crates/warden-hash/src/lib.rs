//! Warden Hashing
//!
//! Deterministic hashing for evidence bundles.
//!
//! # Core Concepts
//!
//! - [`canonical`]: one byte string per JSON value (sorted keys, compact,
//!   fixed number and string rules)
//! - [`ContentHash`]: 32-byte SHA-256 digest with hex display
//! - [`HashChain`]: append-only, order-sensitive chain of element hashes
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_hash::HashChain;
//! use serde_json::json;
//!
//! let mut chain = HashChain::new();
//! chain.append("context", &json!({"user": "alice"}));
//! chain.append("authority_version", &json!("1.0.0"));
//! let root = chain.root().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod canonical;
mod chain;
mod hash;

pub use canonical::{canonical_bytes, canonical_string, to_canonical_bytes};
pub use chain::{ChainEntry, HashChain};
pub use hash::{ContentHash, HashError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
