//! Unified error types for Kumquat.
//!
//! This module provides the single error type returned by every fallible
//! operation of the engine and its adapters.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
