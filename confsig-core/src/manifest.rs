//! Compose manifest descriptor source.
//!
//! Only the top-level `configs:` section is interpreted:
//!
//! ```yaml
//! configs:
//!   nginx_conf:
//!     file: ./nginx.conf
//!     name: myapp_nginx_csig_NGINX_CONF
//!     labels:
//!       name: myapp_nginx
//! ```
//!
//! # Resolution rules
//!
//! - `name` defaults to `<namespace>_<key>`.
//! - Relative `file` paths resolve against the manifest's directory.
//! - Label values (map or `KEY=VALUE` list form) become lookup labels.
//! - `external` entries and entries without `file` are skipped.
//! - Later manifests override earlier ones by key.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, ManifestError};
use crate::types::{ConfigDescriptor, ConfigKey, NameTemplate, Namespace, NAME_MARKER};

// ---------------------------------------------------------------------------
// 1. Source trait
// ---------------------------------------------------------------------------

/// Produces the ordered descriptor list the namer and reconciler consume.
pub trait DescriptorSource {
    fn resolve(
        &self,
        namespace: &Namespace,
        manifests: &[PathBuf],
    ) -> Result<Vec<ConfigDescriptor>, ManifestError>;
}

/// [`DescriptorSource`] backed by compose YAML files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeSource;

impl DescriptorSource for ComposeSource {
    fn resolve(
        &self,
        namespace: &Namespace,
        manifests: &[PathBuf],
    ) -> Result<Vec<ConfigDescriptor>, ManifestError> {
        load_descriptors(namespace, manifests)
    }
}

// ---------------------------------------------------------------------------
// 2. On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    configs: Option<BTreeMap<String, Option<ComposeConfig>>>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposeConfig {
    file: Option<PathBuf>,
    name: Option<String>,
    #[serde(default)]
    labels: ComposeLabels,
    #[serde(default)]
    external: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ComposeLabels {
    Map(BTreeMap<String, Option<String>>),
    List(Vec<String>),
}

impl Default for ComposeLabels {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ComposeLabels {
    fn values(&self) -> BTreeSet<String> {
        match self {
            Self::Map(map) => map
                .values()
                .flatten()
                .filter(|v| !v.is_empty())
                .cloned()
                .collect(),
            Self::List(items) => items
                .iter()
                .filter_map(|item| item.split_once('=').map(|(_, v)| v))
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl ComposeConfig {
    fn is_external(&self) -> bool {
        match &self.external {
            None | Some(serde_yaml::Value::Null) => false,
            Some(serde_yaml::Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Parse every manifest in order and merge their `configs:` sections.
///
/// Returns descriptors sorted by config key. Fails with
/// [`ManifestError::NoManifests`] when `manifests` is empty.
pub fn load_descriptors(
    namespace: &Namespace,
    manifests: &[PathBuf],
) -> Result<Vec<ConfigDescriptor>, ManifestError> {
    if manifests.is_empty() {
        return Err(ManifestError::NoManifests);
    }

    let mut merged: BTreeMap<ConfigKey, ConfigDescriptor> = BTreeMap::new();
    for path in manifests {
        let compose = read_manifest(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        for (key, entry) in compose.configs.unwrap_or_default() {
            let key = ConfigKey::from(key);
            let entry = entry.unwrap_or_default();
            if entry.is_external() {
                tracing::debug!("skipping external config '{key}'");
                merged.remove(&key);
                continue;
            }
            let Some(file) = entry.file.as_ref() else {
                tracing::debug!("skipping config '{key}' without a file source");
                merged.remove(&key);
                continue;
            };

            let descriptor = build_descriptor(namespace, &key, &entry, base_dir.join(file))?;
            merged.insert(key, descriptor);
        }
    }

    Ok(merged.into_values().collect())
}

fn read_manifest(path: &Path) -> Result<ComposeFile, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    // An empty document deserializes to unit, not a mapping.
    if contents.trim().is_empty() {
        return Ok(ComposeFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn build_descriptor(
    namespace: &Namespace,
    key: &ConfigKey,
    entry: &ComposeConfig,
    file: PathBuf,
) -> Result<ConfigDescriptor, ManifestError> {
    let name = entry
        .name
        .clone()
        .unwrap_or_else(|| format!("{namespace}_{key}"));
    let template = if name.contains(NAME_MARKER) {
        Some(NameTemplate::parse(key, &name)?)
    } else {
        None
    };

    Ok(ConfigDescriptor {
        key: key.clone(),
        name,
        template,
        file,
        labels: entry.labels.values(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
