//! Unified error types for Kumquat.
//!
//! Template defects the engine tolerates (missing values, unrecognised
//! markers) are never reported here; they are logged and rendered into the
//! output. Only failures that abort a whole document build are errors.
use thiserror::Error;

/// Main error type for Kumquat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Expected document tree shape is absent
    #[error("Structure error: {0}")]
    Structure(String),

    /// The data context has no array under the outer collection name
    #[error("Missing collection: {0}")]
    MissingCollection(String),

    /// The data payload has an unusable shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A clone group was still open at the end of a table
    #[error("Unclosed clone group '{key}' in table {table}")]
    UnclosedCloneGroup { table: usize, key: String },

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Kumquat operations.
pub type Result<T> = std::result::Result<T, Error>;
