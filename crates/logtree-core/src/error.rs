//! Error types for logtree

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for logger tree operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Dotted module name exceeds the maximum length
    #[error("exceeded maximum length ({max}) for module name {prefix}...")]
    NameTooLong {
        /// First `max` bytes of the rejected name
        prefix: String,
        /// Allowed maximum, in bytes
        max: usize,
    },

    /// Dotted module name has more segments than allowed
    #[error("max number of module subfields ({max}) exceeded for {name}")]
    TooManySegments {
        /// The rejected name
        name: String,
        /// Allowed maximum number of segments
        max: usize,
    },

    /// Log file could not be created or opened
    #[error("error opening log file '{}': {source}", path.display())]
    Io {
        /// Path as given by the caller
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The logger tree was found in a state its ownership model forbids
    #[error("tree invariant violated: {0}")]
    TreeInvariant(String),
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;
