//! `confsig prune`: remove configs left behind by earlier deployments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use confsig_core::ComposeSource;
use confsig_reconcile::{
    docker::DOCKER_BIN_ENV, remove_stale_configs, ConfigAction, DockerCli, ReconcileOptions,
    ReconcileReport,
};

use super::ManifestArgs;

/// Arguments for `confsig prune`.
#[derive(Args, Debug)]
pub struct PruneArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// List what would be removed without removing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to the docker client binary.
    #[arg(long, env = DOCKER_BIN_ENV, default_value = "docker")]
    pub docker: PathBuf,

    /// Docker daemon to talk to (passed as `-H`).
    #[arg(long, short = 'H')]
    pub host: Option<String>,
}

#[derive(Serialize)]
struct PruneReportJson {
    summary: PruneSummaryJson,
    configs: Vec<PruneConfigJson>,
}

#[derive(Serialize)]
struct PruneSummaryJson {
    dry_run: bool,
    removed: usize,
    in_use: usize,
    would_remove: usize,
}

#[derive(Serialize)]
struct PruneConfigJson {
    id: String,
    name: String,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
}

#[derive(Tabled)]
struct PruneTableRow {
    #[tabled(rename = "config")]
    name: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "outcome")]
    outcome: String,
}

impl PruneArgs {
    pub fn run(self) -> Result<()> {
        let mut store = DockerCli::new(&self.docker);
        if let Some(host) = self.host.as_deref() {
            store = store.with_host(host);
        }
        tracing::debug!("using docker client {}", store.binary().display());

        let namespace = self.manifest.namespace();
        let report = remove_stale_configs(
            &ComposeSource,
            &store,
            &namespace,
            &self.manifest.files,
            ReconcileOptions {
                dry_run: self.dry_run,
            },
        )
        .with_context(|| format!("prune failed for namespace '{namespace}'"))?;

        if self.json {
            print_json(&report, self.dry_run)?;
            return Ok(());
        }

        print_table(&report, self.dry_run);
        Ok(())
    }
}

fn print_json(report: &ReconcileReport, dry_run: bool) -> Result<()> {
    let payload = PruneReportJson {
        summary: PruneSummaryJson {
            dry_run,
            removed: report.removed(),
            in_use: report.in_use(),
            would_remove: report.would_remove(),
        },
        configs: report
            .outcomes
            .iter()
            .map(|o| PruneConfigJson {
                id: o.config.id.to_string(),
                name: o.config.name.clone(),
                outcome: action_key(&o.action).to_string(),
                service: match &o.action {
                    ConfigAction::InUse { service } => Some(service.clone()),
                    _ => None,
                },
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize prune JSON")?
    );
    Ok(())
}

fn print_table(report: &ReconcileReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.outcomes.is_empty() {
        println!("{prefix}✓ no stale configs");
        return;
    }

    if dry_run {
        println!("{prefix}✓ {} config(s) would be removed", report.would_remove());
    } else {
        println!(
            "✓ {} removed, {} still in use",
            report.removed(),
            report.in_use()
        );
    }

    let rows: Vec<PruneTableRow> = report
        .outcomes
        .iter()
        .map(|o| PruneTableRow {
            name: o.config.name.clone(),
            id: o.config.id.to_string(),
            outcome: action_label(&o.action),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn action_key(action: &ConfigAction) -> &'static str {
    match action {
        ConfigAction::Removed => "removed",
        ConfigAction::InUse { .. } => "in_use",
        ConfigAction::WouldRemove => "would_remove",
    }
}

fn action_label(action: &ConfigAction) -> String {
    match action {
        ConfigAction::Removed => "REMOVED".red().bold().to_string(),
        ConfigAction::InUse { service } => format!("{} ({service})", "IN USE".green().bold()),
        ConfigAction::WouldRemove => "WOULD REMOVE".yellow().bold().to_string(),
    }
}
