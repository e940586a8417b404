//! Domain types shared by the digest namer and the stale reconciler.
//!
//! Descriptors are built fresh from the manifests on every invocation and
//! never persisted. [`RemoteConfig`] mirrors an object owned by the
//! orchestrator; this workspace only reads it and conditionally deletes it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Marker that separates the static part of a config name from the name of
/// the variable the digest is bound to.
pub const NAME_MARKER: &str = "csig_";

/// Platform ceiling on orchestrator config-object names.
pub const MAX_CONFIG_NAME_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stack namespace the manifests are deployed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace(pub String);

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Key of a config entry inside the manifest's `configs:` section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigKey(pub String);

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque orchestrator-assigned identifier of a config object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigId(pub String);

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ConfigId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConfigId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Name template
// ---------------------------------------------------------------------------

/// A config name split at the digest marker.
///
/// `static_prefix` is everything up to and including the marker, minus the
/// marker's trailing `_`. It is authoritative and never shortened.
/// `digest_variable` names the binding the digest is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameTemplate {
    pub static_prefix: String,
    pub digest_variable: String,
}

impl NameTemplate {
    /// Split `raw` on the first occurrence of [`NAME_MARKER`].
    ///
    /// The variable token may be written bare (`CFG_HASH`) or as a shell
    /// reference (`$CFG_HASH`, `${CFG_HASH}`). After normalisation it must be
    /// a portable variable name, since it ends up in `export` lines.
    pub fn parse(key: &ConfigKey, raw: &str) -> Result<Self, ManifestError> {
        let Some(idx) = raw.find(NAME_MARKER) else {
            return Err(ManifestError::MissingMarker {
                key: key.clone(),
                name: raw.to_owned(),
            });
        };
        let marker_end = idx + NAME_MARKER.len();
        let static_prefix = raw[..marker_end].trim_end_matches('_').to_owned();
        let digest_variable = normalize_variable(&raw[marker_end..]);
        if digest_variable.is_empty() {
            return Err(ManifestError::EmptyDigestVariable {
                key: key.clone(),
                name: raw.to_owned(),
            });
        }
        if !is_variable_name(&digest_variable) {
            return Err(ManifestError::InvalidDigestVariable {
                key: key.clone(),
                name: raw.to_owned(),
                variable: digest_variable,
            });
        }
        Ok(Self {
            static_prefix,
            digest_variable,
        })
    }

    /// Length of the prefix in characters.
    pub fn prefix_len(&self) -> usize {
        self.static_prefix.chars().count()
    }

    /// Characters left for the digest under [`MAX_CONFIG_NAME_LEN`].
    ///
    /// `None` when the prefix alone already exceeds the ceiling.
    pub fn remaining(&self) -> Option<usize> {
        MAX_CONFIG_NAME_LEN.checked_sub(self.prefix_len())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn normalize_variable(token: &str) -> String {
    let token = token.trim();
    let token = token
        .strip_prefix("${")
        .and_then(|t| t.strip_suffix('}'))
        .or_else(|| token.strip_prefix('$'))
        .unwrap_or(token);
    token.to_owned()
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One configuration object declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDescriptor {
    pub key: ConfigKey,
    /// Full name as written in the manifest (or the namespace default).
    pub name: String,
    /// Present only when `name` carries the digest marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<NameTemplate>,
    /// Local file whose content determines the digest.
    pub file: PathBuf,
    /// Label values used as lookup keys on the orchestrator side.
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

/// A config object as reported by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub id: ConfigId,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
