//! Warden command line support
//!
//! Configuration loading, logging setup and the `verify` / `inspect` / `hash`
//! commands behind the `warden` binary.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod logging;

pub use config::{LogConfig, LogFormat, WardenConfig};
