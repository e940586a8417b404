//! [`ConfigStore`] backed by the `docker` command-line client.
//!
//! - list: `docker [-H host] config ls --format '{{json .}}' --filter label=name=<v>`,
//!   once per label value
//! - remove: `docker [-H host] config rm <id>`
//!
//! The daemon reports in-use conflicts only as text; this adapter is the one
//! place that text is interpreted.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde::Deserialize;

use confsig_core::{ConfigId, RemoteConfig};

use crate::error::{RemoveError, StoreError};
use crate::store::{ConfigStore, FilterSet};

/// Environment variable the CLI reads the `docker` binary path from.
pub const DOCKER_BIN_ENV: &str = "CONFSIG_DOCKER";

const IN_USE_PHRASE: &str = "is in use by the following service:";

/// Drives `docker config` subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCli {
    binary: PathBuf,
    host: Option<String>,
}

impl DockerCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            host: None,
        }
    }

    /// Daemon socket passed as `-H`. When unset docker reads `DOCKER_HOST`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    fn args(&self, rest: &[OsString]) -> Vec<OsString> {
        let mut args = Vec::with_capacity(rest.len() + 2);
        if let Some(host) = &self.host {
            args.push(OsString::from("-H"));
            args.push(OsString::from(host));
        }
        args.extend(rest.iter().cloned());
        args
    }

    fn run(&self, rest: &[OsString]) -> Result<Output, StoreError> {
        let args = self.args(rest);
        let command = self.describe(&args);
        tracing::debug!("running {command}");
        Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| StoreError::Spawn { command, source })
    }

    fn list_one(&self, predicate: &str) -> Result<Vec<RemoteConfig>, StoreError> {
        let rest: Vec<OsString> = ["config", "ls", "--format", "{{json .}}", "--filter", predicate]
            .into_iter()
            .map(OsString::from)
            .collect();
        let output = self.run(&rest)?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command: self.describe(&self.args(&rest)),
                message: stderr_message(&output),
            });
        }
        parse_listing(&String::from_utf8_lossy(&output.stdout))
    }

    fn describe(&self, args: &[OsString]) -> String {
        let mut parts = vec![self.binary.display().to_string()];
        parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

impl ConfigStore for DockerCli {
    /// One `config ls` per predicate, merged in first-seen order and
    /// de-duplicated by ID.
    ///
    /// The daemon folds repeated `label` filters into a single key/value map,
    /// so passing several `--filter label=name=..` at once would match only
    /// one of them. An empty filter set lists nothing.
    fn list_configs(&self, filters: &FilterSet) -> Result<Vec<RemoteConfig>, StoreError> {
        let mut seen = HashSet::new();
        let mut configs = Vec::new();
        for predicate in filters.predicates() {
            for config in self.list_one(&predicate)? {
                if seen.insert(config.id.clone()) {
                    configs.push(config);
                }
            }
        }
        Ok(configs)
    }

    fn remove_config(&self, id: &ConfigId) -> Result<(), RemoveError> {
        let rest = [
            OsString::from("config"),
            OsString::from("rm"),
            OsString::from(&id.0),
        ];
        let output = self.run(&rest)?;
        if output.status.success() {
            return Ok(());
        }

        let message = stderr_message(&output);
        if let Some(service) = in_use_service(&message) {
            return Err(RemoveError::InUse {
                id: id.clone(),
                service,
            });
        }
        Err(RemoveError::Other(StoreError::CommandFailed {
            command: self.describe(&self.args(&rest)),
            message,
        }))
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ConfigLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Labels", default)]
    labels: String,
}

/// Parse `docker config ls --format '{{json .}}'` output, one object per line.
pub(crate) fn parse_listing(stdout: &str) -> Result<Vec<RemoteConfig>, StoreError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parsed: ConfigLine =
                serde_json::from_str(line).map_err(|source| StoreError::Decode {
                    line: line.to_owned(),
                    source,
                })?;
            Ok(RemoteConfig {
                id: ConfigId::from(parsed.id),
                name: parsed.name,
                labels: parse_labels(&parsed.labels),
            })
        })
        .collect()
}

/// `k=v,k2=v2` → map. Entries without `=` map to an empty value.
fn parse_labels(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (entry.to_owned(), String::new()),
        })
        .collect()
}

/// Service named in an in-use conflict, if `message` is one.
pub(crate) fn in_use_service(message: &str) -> Option<String> {
    let (_, rest) = message.split_once(IN_USE_PHRASE)?;
    let service = rest.lines().next().unwrap_or("").trim();
    Some(service.to_owned())
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
