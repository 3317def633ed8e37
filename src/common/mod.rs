//! Common types and utilities shared across the crate.
//!
//! This module provides the unified error type, unit conversions used to
//! size drawing anchors, and the XML text helpers used by the tree adapter.

// Submodule declarations
pub mod error;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
