//! Error types for confsig-reconcile.

use thiserror::Error;

use confsig_core::{ConfigId, ManifestError};

/// Failures talking to the orchestrator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The client process could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The client ran and reported failure.
    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    /// A listing line could not be decoded.
    #[error("unexpected config listing line '{line}': {source}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of a failed removal, classified by the client.
#[derive(Debug, Error)]
pub enum RemoveError {
    /// A running service still references the config.
    #[error("config {id} is in use by service '{service}'")]
    InUse { id: ConfigId, service: String },

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] StoreError),
}

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The descriptor source failed.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A list or remove call failed with anything but an in-use conflict.
    #[error("orchestrator API error ({context}): {source}")]
    Api {
        context: String,
        #[source]
        source: StoreError,
    },
}
