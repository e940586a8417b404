//! Error types for confsig-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ConfigKey;

/// All errors that can arise while resolving manifests into descriptors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No manifest paths were given.
    #[error("no manifest files given")]
    NoManifests,

    /// Underlying I/O failure reading a manifest.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error; includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config name does not contain the digest marker.
    #[error("config '{key}' name '{name}' has no 'csig_' marker")]
    MissingMarker { key: ConfigKey, name: String },

    /// The marker is present but nothing names the digest variable.
    #[error("config '{key}' name '{name}' has no variable after the 'csig_' marker")]
    EmptyDigestVariable { key: ConfigKey, name: String },

    /// The digest variable is not a portable environment variable name
    /// (`[A-Za-z_][A-Za-z0-9_]*`).
    #[error("config '{key}' name '{name}' has an invalid digest variable '{variable}'")]
    InvalidDigestVariable {
        key: ConfigKey,
        name: String,
        variable: String,
    },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
