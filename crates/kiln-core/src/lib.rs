//! Kiln Core - Foundational types for the Kiln sandbox
//!
//! This crate provides what every other Kiln crate leans on:
//! - `Transform` - scale/rotate/translate triple with affine conversion
//! - `SandboxConfig` - TOML-backed settings
//! - Logging bootstrap and the crash-dump panic hook
//! - Error types and Result alias

pub mod config;
pub mod crash;
mod error;
pub mod logging;
mod types;

pub use config::SandboxConfig;
pub use error::{KilnError, Result};
pub use types::Transform;
