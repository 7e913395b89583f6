//! Error types for DrishtiCore

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiCore error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed template pack or feature frame
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Pack/frame version this build does not understand
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Supported format version
        expected: u8,
        /// Version found in the data
        found: u8,
    },

    /// Template unusable for matching
    #[error("Bad template {name:?}: {reason}")]
    BadTemplate {
        /// Template name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
