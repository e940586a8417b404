//! Digest bindings: the explicit output of the digest namer.
//!
//! Maps each digest variable to the (possibly truncated) decimal checksum.
//! Callers choose how a later deployment stage sees them: rendered as shell
//! exports, dotenv lines or JSON, written atomically to a file, or applied
//! to the current process environment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use confsig_core::ConfigKey;

use crate::error::{export_err, DigestError};

/// One bound digest and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestBinding {
    pub key: ConfigKey,
    pub variable: String,
    pub static_prefix: String,
    /// Full decimal checksum before truncation.
    pub checksum: String,
    /// Value bound to `variable`.
    pub digest: String,
}

impl DigestBinding {
    pub fn is_truncated(&self) -> bool {
        self.digest.len() < self.checksum.len()
    }
}

/// Variable name → binding, ordered by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestBindings {
    entries: BTreeMap<String, DigestBinding>,
}

impl DigestBindings {
    /// Add a binding. Re-binding a variable to the same digest is a no-op;
    /// a different digest is a [`DigestError::ConflictingBinding`].
    pub fn insert(&mut self, binding: DigestBinding) -> Result<(), DigestError> {
        if let Some(existing) = self.entries.get(&binding.variable) {
            if existing.digest == binding.digest {
                return Ok(());
            }
            return Err(DigestError::ConflictingBinding {
                variable: binding.variable,
                existing: existing.digest.clone(),
                incoming: binding.digest,
            });
        }
        self.entries.insert(binding.variable.clone(), binding);
        Ok(())
    }

    /// Bound digest for `variable`.
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.entries.get(variable).map(|b| b.digest.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DigestBinding> {
        self.entries.values()
    }

    /// Plain variable → digest map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, b)| (k.clone(), b.digest.clone()))
            .collect()
    }

    /// Store every binding in the current process environment.
    ///
    /// All names and values are validated before anything is written, so a
    /// failure leaves the environment untouched.
    pub fn apply_to_env(&self) -> Result<(), DigestError> {
        for binding in self.entries.values() {
            validate_env_pair(&binding.variable, &binding.digest)?;
        }
        for binding in self.entries.values() {
            std::env::set_var(&binding.variable, &binding.digest);
        }
        Ok(())
    }

    /// Render in `format`.
    pub fn render(&self, format: ExportFormat) -> Result<String, DigestError> {
        let out = match format {
            ExportFormat::Env => self
                .entries
                .values()
                .map(|b| format!("export {}={}\n", b.variable, b.digest))
                .collect(),
            ExportFormat::Dotenv => self
                .entries
                .values()
                .map(|b| format!("{}={}\n", b.variable, b.digest))
                .collect(),
            ExportFormat::Json => {
                let mut json = serde_json::to_string_pretty(&self.to_map())?;
                json.push('\n');
                json
            }
        };
        Ok(out)
    }

    /// Render in `format` and write to `path` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn write_to(&self, path: &Path, format: ExportFormat) -> Result<(), DigestError> {
        let contents = self.render(format)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| export_err(dir, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, contents).map_err(|e| export_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(export_err(path, e));
        }
        Ok(())
    }
}

fn validate_env_pair(variable: &str, value: &str) -> Result<(), DigestError> {
    let reason = if variable.is_empty() {
        Some("name is empty")
    } else if variable.contains('=') {
        Some("name contains '='")
    } else if variable.contains('\0') || value.contains('\0') {
        Some("name or value contains a NUL byte")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(DigestError::Environment {
            variable: variable.to_owned(),
            reason: reason.to_owned(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Export format
// ---------------------------------------------------------------------------

/// How bindings are rendered for a later stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// `export NAME=VALUE` lines for `eval` / `source`.
    #[default]
    Env,
    /// `NAME=VALUE` lines (`docker stack deploy` with an env file).
    Dotenv,
    /// A JSON object of name → value.
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "env" | "shell" => Ok(Self::Env),
            "dotenv" => Ok(Self::Dotenv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown export format '{other}'; expected: env, dotenv, json"
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Env => write!(f, "env"),
            ExportFormat::Dotenv => write!(f, "dotenv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}
