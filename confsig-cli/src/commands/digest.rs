//! `confsig digest`: compute content digests for templated configs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use confsig_core::ComposeSource;
use confsig_digest::{compute_digests, DigestBindings, ExportFormat};

use super::ManifestArgs;

/// Arguments for `confsig digest`.
#[derive(Args, Debug)]
pub struct DigestArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Output format: env (export lines), dotenv, json.
    #[arg(long, default_value_t = ExportFormat::Env)]
    pub format: ExportFormat,

    /// Write the bindings to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Tabled)]
struct BindingRow {
    #[tabled(rename = "variable")]
    variable: String,
    #[tabled(rename = "config")]
    config: String,
    #[tabled(rename = "digest")]
    digest: String,
    #[tabled(rename = "truncated")]
    truncated: String,
}

impl DigestArgs {
    pub fn run(self) -> Result<()> {
        let namespace = self.manifest.namespace();
        let bindings = compute_digests(&ComposeSource, &namespace, &self.manifest.files)
            .with_context(|| format!("digest failed for namespace '{namespace}'"))?;

        let Some(output) = self.output else {
            print!("{}", bindings.render(self.format)?);
            return Ok(());
        };

        bindings
            .write_to(&output, self.format)
            .with_context(|| format!("could not write '{}'", output.display()))?;
        print_summary(&bindings, &output);
        Ok(())
    }
}

fn print_summary(bindings: &DigestBindings, output: &std::path::Path) {
    if bindings.is_empty() {
        println!("✓ no csig_ configs found, wrote empty {}", output.display());
        return;
    }

    println!(
        "✓ wrote {} binding(s) to {}",
        bindings.len(),
        output.display()
    );
    let rows: Vec<BindingRow> = bindings
        .iter()
        .map(|b| BindingRow {
            variable: b.variable.clone(),
            config: b.key.to_string(),
            digest: b.digest.clone(),
            truncated: if b.is_truncated() {
                format!("from {}", b.checksum).yellow().to_string()
            } else {
                "no".to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
