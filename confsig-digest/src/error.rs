//! Error types for confsig-digest.

use std::path::PathBuf;

use thiserror::Error;

use confsig_core::{ConfigKey, ManifestError};

/// All errors that can arise while computing and binding digests.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The descriptor source failed.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The referenced file could not be opened.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading content into the checksum failed part-way.
    #[error("checksum failed for {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The static prefix alone exceeds the config name ceiling.
    #[error(
        "config '{key}' prefix is {prefix_len} characters, over the {limit}-character name limit"
    )]
    PrefixTooLong {
        key: ConfigKey,
        prefix_len: usize,
        limit: usize,
    },

    /// Two descriptors bind the same variable to different digests.
    #[error("variable {variable} bound to both {existing} and {incoming}")]
    ConflictingBinding {
        variable: String,
        existing: String,
        incoming: String,
    },

    /// A binding could not be stored in the process environment.
    #[error("cannot set environment variable '{variable}': {reason}")]
    Environment { variable: String, reason: String },

    /// An export destination could not be written.
    #[error("failed to write bindings to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON export error.
    #[error("bindings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`DigestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DigestError {
    DigestError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`DigestError::Export`].
pub(crate) fn export_err(path: impl Into<PathBuf>, source: std::io::Error) -> DigestError {
    DigestError::Export {
        path: path.into(),
        source,
    }
}
