//! Error types for cfr2-core
//!
//! Every failure carries enough context (object key, bucket, local path) to be
//! printed as-is by the command dispatcher.

use thiserror::Error;

/// Result type alias for cfr2-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cfr2 operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The store client could not be constructed
    #[error("Failed to create R2 client: {0}")]
    Client(String),

    /// A remote object-store call failed
    #[error("{context}: {message}")]
    Store { context: String, message: String },

    /// Rename copied the object but could not delete the original.
    ///
    /// Both keys exist in the bucket afterwards and must be cleaned up by hand.
    #[error(
        "copy to '{new_key}' succeeded but failed to delete original object '{old_key}' \
         from bucket '{bucket}' (both keys now exist): {message}"
    )]
    RenameIncomplete {
        bucket: String,
        old_key: String,
        new_key: String,
        message: String,
    },

    /// Arguments that can never produce a valid operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Local filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a store error from an operation description and the backend message
    pub fn store(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Store {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Build an IO error tagged with what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the remote state may have been left partially modified
    pub const fn is_partial(&self) -> bool {
        matches!(self, Error::RenameIncomplete { .. })
    }
}
